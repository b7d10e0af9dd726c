use std::fmt::Write;

use crate::domain::directory::PartyProfile;
use crate::domain::shared::{format_money, Reference};
use super::document::Invoice;

// ============================================================================
// Invoice Rendering
// ============================================================================
//
// Plain UTF-8 document. Same invoice in, same bytes out.
//
// ============================================================================

fn party_line(label: &str, party: &Reference<PartyProfile>) -> String {
    match party {
        Reference::Resolved(profile) => {
            let mut line = format!("{label} : {} ({})", profile.display_name, profile.id);
            if let Some(address) = &profile.address {
                let _ = write!(line, ", {address}");
            }
            line
        }
        Reference::Id(id) => format!("{label} : {id}"),
    }
}

pub fn render_invoice(invoice: &Invoice) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "FACTURE {}", invoice.number);
    let _ = writeln!(doc, "Commande : {}", invoice.order_reference);
    let _ = writeln!(doc, "Date : {}", invoice.issued_on.format("%Y-%m-%d"));
    let _ = writeln!(doc, "{}", party_line("Boutique", &invoice.vendor));
    let _ = writeln!(doc, "{}", party_line("Client", &invoice.shopper));
    let _ = writeln!(doc, "{}", "-".repeat(48));

    for line in &invoice.lines {
        let _ = writeln!(
            doc,
            "{} : {} x {} = {}",
            line.description,
            line.quantity,
            format_money(line.unit_price),
            format_money(line.line_total)
        );
    }

    let _ = writeln!(doc, "{}", "-".repeat(48));
    let _ = writeln!(doc, "Sous-total : {}", format_money(invoice.subtotal));
    let _ = writeln!(
        doc,
        "Frais de livraison ({}) : {}",
        invoice.delivery_mode.as_str(),
        format_money(invoice.delivery_fee)
    );
    let _ = writeln!(doc, "Total : {}", format_money(invoice.grand_total));
    let _ = writeln!(doc, "Paiement : {}", invoice.payment_method.as_str());

    doc
}
