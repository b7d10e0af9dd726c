use rust_decimal::Decimal;
use uuid::Uuid;

use crate::app::MallServices;
use crate::domain::catalog::{CatalogError, ProductDraft};
use crate::domain::directory::{PartyKind, PartyProfile};
use crate::domain::shared::Principal;

// ============================================================================
// Demo Data
// ============================================================================
//
// Two boutiques, one shopper and one admin with fixed ids, so the demo
// tokens below stay valid across restarts.
//
// ============================================================================

pub const DEMO_BOUTIQUE_KENTE: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0001);
pub const DEMO_BOUTIQUE_BOGOLAN: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0002);
pub const DEMO_SHOPPER: Uuid = Uuid::from_u128(0x0000_0002_0000_4000_8000_0000_0000_0001);
pub const DEMO_ADMIN: Uuid = Uuid::from_u128(0x0000_0003_0000_4000_8000_0000_0000_0001);

/// Token table entries for the demo parties
pub fn demo_identity_entries() -> String {
    format!(
        "demo-kente:boutique:{DEMO_BOUTIQUE_KENTE},\
         demo-bogolan:boutique:{DEMO_BOUTIQUE_BOGOLAN},\
         demo-client:client:{DEMO_SHOPPER},\
         demo-admin:admin:{DEMO_ADMIN}"
    )
}

fn draft(name: &str, price: Decimal, stock: u32) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        image_url: None,
        price,
        stock,
        promotion: None,
    }
}

/// Register demo profiles and products; returns the number of products created
pub async fn seed_demo(services: &MallServices) -> Result<usize, CatalogError> {
    services
        .directory
        .register(
            PartyProfile::new(DEMO_BOUTIQUE_KENTE, PartyKind::Boutique, "Atelier Kente")
                .with_email("contact@atelier-kente.example")
                .with_address("12 galerie Nord, niveau 1"),
        )
        .await;
    services
        .directory
        .register(
            PartyProfile::new(DEMO_BOUTIQUE_BOGOLAN, PartyKind::Boutique, "Maison Bogolan")
                .with_email("bonjour@maison-bogolan.example")
                .with_address("4 galerie Sud, niveau 2"),
        )
        .await;
    services
        .directory
        .register(PartyProfile::new(DEMO_SHOPPER, PartyKind::Shopper, "Awa Diallo").with_email("awa@example.com"))
        .await;

    let catalog = [
        (
            DEMO_BOUTIQUE_KENTE,
            vec![
                draft("Pagne kente", Decimal::new(2000, 2), 5),
                draft("Écharpe tissée", Decimal::new(1450, 2), 12),
                draft("Sac en raphia", Decimal::new(3500, 2), 2),
            ],
        ),
        (
            DEMO_BOUTIQUE_BOGOLAN,
            vec![
                draft("Coussin bogolan", Decimal::new(1500, 2), 1),
                draft("Nappe brodée", Decimal::new(4200, 2), 8),
            ],
        ),
    ];

    let mut created = 0;
    for (vendor_id, drafts) in catalog {
        let vendor = Principal::vendor(vendor_id);
        for draft in drafts {
            let product = services.catalog.create_product(&vendor, draft).await?;
            tracing::debug!(product_id = %product.id, vendor_id = %vendor_id, name = %product.name, "Demo product seeded");
            created += 1;
        }
    }

    tracing::info!(products = created, "🌱 Demo catalog seeded");
    Ok(created)
}
