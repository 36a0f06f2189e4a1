//! Combines raw times with administrator data into the final schedule.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use miqat_types::{
    HijriDay, Location, Prayer, PrayerSchedule, PrayerSlot, RawSchedule, SourceLayer, TimeSpec, resolve_local,
};
use tracing::debug;

use crate::store::{IqamahTimes, PrayerOverride, TarawihConfig};

/// Builds a [`PrayerSchedule`].
///
/// Active overrides for the schedule date replace computed Adhan times and
/// mark those slots `ManualOverride`. Iqamah and Tarawih are resolved
/// against the effective (post-override) Adhan times and never change them.
/// Pure: the same inputs always yield the same schedule.
pub fn merge(
    raw: &RawSchedule,
    location: &Location,
    overrides: &[PrayerOverride],
    iqamah: &IqamahTimes,
    tarawih: &TarawihConfig,
    hijri: HijriDay,
    qibla_bearing: f64,
) -> PrayerSchedule {
    let tz = location.timezone;
    let date = raw.date;

    let adhan: [(DateTime<FixedOffset>, SourceLayer); 6] = Prayer::ALL.map(|prayer| {
        let manual = overrides
            .iter()
            .filter(|o| o.is_active && o.date == date && o.prayer == prayer && prayer.is_obligatory())
            .max_by_key(|o| (o.updated_at, o.id));
        match manual {
            Some(o) => {
                debug!(%date, %prayer, time = %o.time, "Applying override");
                (wall_clock(tz, date, o.time), SourceLayer::ManualOverride)
            }
            None => (raw.times.get(prayer).with_timezone(&tz).fixed_offset(), raw.source.clone()),
        }
    });
    let effective = |prayer: Prayer| adhan[prayer as usize].0;

    let slots = Prayer::ALL.map(|prayer| {
        let (time, source) = adhan[prayer as usize].clone();
        let iqamah = iqamah.get(prayer).map(|spec| {
            let at = if prayer == Prayer::Isha {
                resolve_after_isha(spec, tz, date, &effective)
            } else {
                resolve(spec, tz, date, &effective)
            };
            // Congregation never starts before the call to prayer.
            at.max(time)
        });
        PrayerSlot { prayer, adhan: time, source, iqamah }
    });

    let tarawih = tarawih.is_visible(hijri).then(|| resolve_after_isha(tarawih.time, tz, date, &effective));

    PrayerSchedule::new(date, *location, raw.method, slots, tarawih, qibla_bearing, hijri, raw.source.clone())
}

fn resolve(
    spec: TimeSpec,
    tz: Tz,
    date: NaiveDate,
    effective: &impl Fn(Prayer) -> DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    match spec {
        TimeSpec::Absolute(time) => wall_clock(tz, date, time),
        TimeSpec::OffsetMinutes { minutes, reference } => effective(reference) + Duration::minutes(minutes),
    }
}

/// Like [`resolve`], but a clock time in the small hours after Isha is
/// read on the following day.
fn resolve_after_isha(
    spec: TimeSpec,
    tz: Tz,
    date: NaiveDate,
    effective: &impl Fn(Prayer) -> DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    let at = resolve(spec, tz, date, effective);
    let TimeSpec::Absolute(time) = spec else {
        return at;
    };
    let isha = effective(Prayer::Isha);
    match date.succ_opt().map(|next| wall_clock(tz, next, time)) {
        Some(next) if at < isha && next - isha <= Duration::hours(12) => next,
        _ => at,
    }
}

fn wall_clock(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
    resolve_local(tz, date.and_time(time)).fixed_offset()
}
