use crate::domain::payout::Payout;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PayoutRow<'a> {
    payout_id: String,
    recipient_id: &'a str,
    recipient_name: &'a str,
    country: &'a str,
    amount: String,
    currency: &'a str,
    rail: &'a str,
    rail_currency: &'a str,
    status: &'a str,
    skip_reason: &'a str,
    payment_order_id: &'a str,
}

impl<'a> From<&'a Payout> for PayoutRow<'a> {
    fn from(p: &'a Payout) -> Self {
        Self {
            payout_id: p.id.to_string(),
            recipient_id: &p.recipient_id,
            recipient_name: p.recipient_name.as_deref().unwrap_or_default(),
            country: p.country.as_deref().unwrap_or_default(),
            amount: format!("{:.2}", p.amount),
            currency: &p.currency,
            rail: p.rail.as_deref().unwrap_or_default(),
            rail_currency: p.rail_currency.as_deref().unwrap_or_default(),
            status: p.status.as_str(),
            skip_reason: p.skip_reason.map(|r| r.as_str()).unwrap_or_default(),
            payment_order_id: p.payment_order_id.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes payouts as CSV, one row per payout, amounts with two decimals.
pub struct PayoutWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PayoutWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payouts<'a>(&mut self, payouts: impl IntoIterator<Item = &'a Payout>) -> Result<()> {
        let mut wrote = false;
        for payout in payouts {
            self.writer.serialize(PayoutRow::from(payout))?;
            wrote = true;
        }
        if !wrote {
            self.writer.write_record(HEADER)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

const HEADER: [&str; 11] = [
    "payout_id",
    "recipient_id",
    "recipient_name",
    "country",
    "amount",
    "currency",
    "rail",
    "rail_currency",
    "status",
    "skip_reason",
    "payment_order_id",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::Recipient;
    use crate::domain::payout::{PayoutStatus, SkipReason};
    use crate::domain::routing::select_rail;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn render(payouts: &[Payout]) -> String {
        let mut buf = Vec::new();
        PayoutWriter::new(&mut buf).write_payouts(payouts).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_writes_header_and_rows() {
        let recipient = Recipient::new("INV-010", "Hans Mueller")
            .with_country("DE")
            .with_method("ACH")
            .with_account("ext_de_001");
        let mut sent = Payout::for_recipient(Uuid::new_v4(), "LIQ-1", &recipient, dec!(100000));
        sent.apply_rail(&select_rail(Some("DE"), Some("ACH"), false));
        sent.status = PayoutStatus::Completed;
        sent.payment_order_id = Some("po_cross_border_00000001".to_string());

        let mut skipped = Payout::for_recipient(Uuid::new_v4(), "LIQ-1", &Recipient::new("INV-020", "Eve"), dec!(33.3));
        skipped.status = PayoutStatus::Skipped;
        skipped.skip_reason = Some(SkipReason::InvalidMethod);

        let out = render(&[sent.clone(), skipped.clone()]);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(
            lines[1],
            format!(
                "{},INV-010,Hans Mueller,DE,100000.00,USD,sepa,EUR,completed,,po_cross_border_00000001",
                sent.id
            )
        );
        assert_eq!(
            lines[2],
            format!("{},INV-020,Eve,,33.30,USD,,,skipped,invalid_method,", skipped.id)
        );
    }

    #[test]
    fn test_empty_output_still_has_header() {
        assert_eq!(render(&[]).trim_end(), HEADER.join(","));
    }
}
