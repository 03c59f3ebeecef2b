use chrono::SecondsFormat;
use std::io::Write;

use super::domain::LeadRecord;

pub const EXPORT_HEADERS: [&str; 6] = ["Name", "Email", "Phone", "Product", "Market", "Time"];

/// Write the admin spreadsheet export, newest lead first.
pub fn write_csv<W: Write>(records: &[LeadRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    csv_writer.write_record(EXPORT_HEADERS)?;
    for record in records.iter().rev() {
        let submitted = record
            .submitted_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        csv_writer.write_record([
            record.name.as_str(),
            record.email.as_str(),
            record.phone.as_str(),
            record.product.as_str(),
            record.country_of_interest.as_str(),
            submitted.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
