pub mod payout_writer;
pub mod recipient_reader;
