use crate::domain::event::Recipient;
use crate::error::{PayoutError, Result};
use std::io::Read;

/// Reads recipients from a CSV source.
///
/// Expected header: `id,name,country,payment_method,external_account_id,has_us_bank_account`.
/// Whitespace is trimmed and empty optional fields read as absent.
pub struct RecipientReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RecipientReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one recipient per row.
    pub fn recipients(self) -> impl Iterator<Item = Result<Recipient>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PayoutError::from))
    }
}
