//! Room-stay charges: one taxable room charge per assigned room

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::charge::{ChargeInput, ChargeSource, ChargeType, SourceType};
use crate::error::BillingError;
use crate::ports::{ReservationSummary, RoomSummary};

const SECONDS_PER_NIGHT: i64 = 24 * 60 * 60;

/// Billable nights: the stay length in 24h blocks, rounded up, at least one
pub fn nights_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Result<i64, BillingError> {
    let seconds = (check_out - check_in).num_seconds();
    if seconds < 0 {
        return Err(BillingError::InvalidInput(format!(
            "check-out {} is before check-in {}",
            check_out, check_in
        )));
    }
    let nights = seconds / SECONDS_PER_NIGHT + i64::from(seconds % SECONDS_PER_NIGHT > 0);
    Ok(nights.max(1))
}

/// Builds the room charges for a reservation
///
/// `rooms` must hold a summary for every room of the reservation; each
/// charge is tagged with `(RoomStay, room_id)` so a later re-run can find it.
pub fn room_stay_charges(
    reservation: &ReservationSummary,
    rooms: &[RoomSummary],
    tax_rate: Decimal,
) -> Result<Vec<ChargeInput>, BillingError> {
    let nights = nights_between(reservation.check_in, reservation.check_out)?;

    rooms
        .iter()
        .map(|room| {
            if room.nightly_rate < Decimal::ZERO {
                return Err(BillingError::InvalidAmount(format!(
                    "room {} has a negative nightly rate",
                    room.room_number
                )));
            }
            let plural = if nights == 1 { "" } else { "s" };
            Ok(ChargeInput::new(
                ChargeType::Room,
                format!("Room {} - {} night{}", room.room_number, nights, plural),
                room.nightly_rate,
            )
            .with_quantity(Decimal::from(nights))
            .with_tax_rate(tax_rate)
            .on(reservation.check_in)
            .from_source(ChargeSource::new(SourceType::RoomStay, room.id))
            .with_details(json!({
                "reservation_id": reservation.id,
                "room_number": room.room_number,
                "nights": nights,
            })))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_kernel::{GuestId, ReservationId, RoomId};
    use rust_decimal_macros::dec;

    fn at(hour: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_nights_round_up() {
        assert_eq!(nights_between(at(14, 1), at(11, 3)).unwrap(), 2);
        assert_eq!(nights_between(at(14, 1), at(14, 3)).unwrap(), 2);
        assert_eq!(nights_between(at(14, 1), at(15, 3)).unwrap(), 3);
    }

    #[test]
    fn test_nights_floor_is_one() {
        assert_eq!(nights_between(at(14, 1), at(14, 1)).unwrap(), 1);
        assert_eq!(nights_between(at(9, 1), at(18, 1)).unwrap(), 1);
    }

    #[test]
    fn test_checkout_before_checkin_rejected() {
        let check_in = at(14, 5);
        assert!(nights_between(check_in, check_in - Duration::hours(1)).is_err());
    }

    #[test]
    fn test_one_charge_per_room() {
        let rooms = vec![
            RoomSummary { id: RoomId::new(), room_number: "101".into(), nightly_rate: dec!(3000) },
            RoomSummary { id: RoomId::new(), room_number: "102".into(), nightly_rate: dec!(4500) },
        ];
        let reservation = ReservationSummary {
            id: ReservationId::new(),
            guest_id: GuestId::new(),
            check_in: at(14, 1),
            check_out: at(11, 4),
            room_ids: rooms.iter().map(|r| r.id).collect(),
        };

        let charges = room_stay_charges(&reservation, &rooms, dec!(18)).unwrap();
        assert_eq!(charges.len(), 2);
        assert_eq!(charges[0].quantity, dec!(3));
        assert_eq!(charges[1].gross_amount(), dec!(13500));
        assert!(charges.iter().all(|c| c.is_taxable && c.tax_rate == Some(dec!(18))));
        assert_eq!(charges[0].description, "Room 101 - 3 nights");
        assert_eq!(charges[1].source.unwrap().source_id, *rooms[1].id.as_uuid());
    }
}
