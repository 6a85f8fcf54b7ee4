// =============================================================================
// Cycle Scheduling — wall-clock aligned ticks
// =============================================================================
//
// Cycles run on wall-clock boundaries that are multiples of `every_minutes`
// past the hour (every 30 minutes: hh:00 and hh:30), so each cycle sees the
// bar that just closed.  `every_minutes` is validated by the config to divide
// 60 evenly.

use chrono::{DateTime, Duration, TimeZone, Timelike};

/// The first boundary strictly after `now`.
pub fn next_boundary<Tz: TimeZone>(now: &DateTime<Tz>, every_minutes: u32) -> DateTime<Tz> {
    let every = every_minutes.clamp(1, 60);
    let into_slot = now.minute() % every;

    let slot_start = now.clone()
        - Duration::minutes(i64::from(into_slot))
        - Duration::seconds(i64::from(now.second()))
        - Duration::nanoseconds(i64::from(now.nanosecond()));

    slot_start + Duration::minutes(i64::from(every))
}

/// How long to sleep from `now` until the next boundary.
pub fn until_next_boundary<Tz: TimeZone>(now: &DateTime<Tz>, every_minutes: u32) -> std::time::Duration {
    let next = next_boundary(now, every_minutes);
    (next - now.clone()).to_std().unwrap_or_default()
}
