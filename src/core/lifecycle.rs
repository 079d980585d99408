use crate::domain::model::{Booking, BookingStatus, RequestContext, Role};
use crate::utils::error::{BookingError, Result};

/// 檢查角色是否可以把預約改成 `to`。
///
/// Admins may do anything. Doctors manage their own bookings while they are still open.
/// Patients may only cancel their own open bookings. Ownership is checked even when
/// the status would not change.
pub fn authorize_transition(
    ctx: &RequestContext,
    booking: &Booking,
    to: BookingStatus,
) -> Result<()> {
    match ctx.role {
        Role::Admin => Ok(()),
        Role::Doctor => {
            if booking.provider_id != ctx.actor_id {
                return Err(BookingError::Forbidden {
                    reason: format!(
                        "booking {} belongs to provider {}",
                        booking.id, booking.provider_id
                    ),
                });
            }
            ensure_open(booking, to)
        }
        Role::Patient => {
            if booking.patient_id != ctx.actor_id {
                return Err(BookingError::Forbidden {
                    reason: format!("booking {} belongs to another patient", booking.id),
                });
            }
            if to != BookingStatus::Cancelled {
                return Err(BookingError::Forbidden {
                    reason: "patients can only cancel bookings".to_string(),
                });
            }
            ensure_open(booking, to)
        }
    }
}

fn ensure_open(booking: &Booking, to: BookingStatus) -> Result<()> {
    // 狀態不變就不算轉換
    if booking.status != to && booking.status.is_terminal() {
        return Err(BookingError::InvalidTransition {
            from: booking.status.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

pub fn authorize_delete(ctx: &RequestContext, booking: &Booking) -> Result<()> {
    if ctx.role != Role::Admin {
        return Err(BookingError::Forbidden {
            reason: format!("only admins can delete booking {}", booking.id),
        });
    }
    Ok(())
}
