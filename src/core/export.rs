use crate::domain::model::Booking;
use crate::domain::time::{format_date, format_time};
use crate::utils::error::{BookingError, Result};

const HEADER: [&str; 8] = [
    "id",
    "patient_id",
    "service_id",
    "date",
    "start",
    "end",
    "status",
    "notes",
];

/// 把一天的預約輸出成 CSV，依開始時間排序，包含已取消的預約
pub fn bookings_to_csv(bookings: &[Booking]) -> Result<String> {
    let mut sorted: Vec<&Booking> = bookings.iter().collect();
    sorted.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for booking in sorted {
        writer.write_record([
            booking.id.as_str(),
            booking.patient_id.as_str(),
            booking.service_id.as_str(),
            format_date(booking.date).as_str(),
            format_time(booking.start_time).as_str(),
            format_time(booking.end_time).as_str(),
            booking.status.as_str(),
            booking.notes.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| BookingError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| BookingError::invalid("csv", e.to_string()))
}
