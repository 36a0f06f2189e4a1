mod common;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use common::*;
use miqat_core::{
    CalculationMethod, HighLatitudeRule, HijriCalendar, InMemoryOverrideStore, Location, OverrideStore, Prayer, RawSchedule,
    SourceLayer, Tz, calculate_prayer_times, merge, qibla_bearing, to_hijri,
};
use proptest::prelude::*;

fn any_method() -> impl Strategy<Value = CalculationMethod> {
    prop::sample::select(
        CalculationMethod::ALL
            .into_iter()
            .filter(|m| *m != CalculationMethod::Custom)
            .collect::<Vec<_>>(),
    )
}

fn any_rule() -> impl Strategy<Value = HighLatitudeRule> {
    prop::sample::select(vec![
        HighLatitudeRule::None,
        HighLatitudeRule::MiddleOfNight,
        HighLatitudeRule::OneSeventh,
        HighLatitudeRule::AngleBased,
        HighLatitudeRule::NearestLatitude,
    ])
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|days| date(2020, 1, 1) + Duration::days(days))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn calculation_is_ordered_and_deterministic(
        lat in -90.0f64..=90.0,
        lng in -180.0f64..180.0,
        elevation in 0.0f64..9000.0,
        day in any_date(),
        method in any_method(),
        rule in any_rule(),
    ) {
        let location = Location::new(lat, lng, Tz::UTC).unwrap().with_elevation(elevation);
        let params = method.params().unwrap().with_high_latitude_rule(rule);

        let first = calculate_prayer_times(day, &location, &params);
        prop_assert!(first.is_ok(), "{:?} {:?} at {} {} {}m on {}: {:?}", method, rule, lat, lng, elevation, day, first);
        let first = first.unwrap();
        let second = calculate_prayer_times(day, &location, &params).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(first.is_ordered());
        prop_assert!(first.imsak < first.fajr);
        prop_assert!(first.sunset <= first.maghrib);
    }

    #[test]
    fn qibla_stays_in_range(lat in -89.0f64..89.0, lng in -180.0f64..180.0) {
        let bearing = qibla_bearing(&Location::new(lat, lng, Tz::UTC).unwrap());
        prop_assert!((0.0..360.0).contains(&bearing));
    }

    #[test]
    fn consecutive_days_advance_hijri(day in any_date()) {
        let today = to_hijri(day, 0).unwrap();
        let tomorrow = to_hijri(day + Duration::days(1), 0).unwrap();
        prop_assert!(tomorrow > today);
        prop_assert!(tomorrow.day == today.day + 1 || tomorrow.day == 1);
    }

    #[test]
    fn umm_al_qura_round_trip(days in 0i64..(130 * 365)) {
        let day = date(1940, 1, 1) + Duration::days(days);
        let hijri = HijriCalendar::UmmAlQura.to_hijri(day, 0).unwrap();
        prop_assert_eq!(HijriCalendar::UmmAlQura.to_gregorian(hijri).unwrap(), day);
    }

    #[test]
    fn override_always_wins(
        prayer in prop::sample::select(Prayer::FIVE.to_vec()),
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let location = doraville();
        let day = date(2025, 1, 15);
        let times = calculate_prayer_times(day, &location, &ISNA.params().unwrap()).unwrap();
        let raw = RawSchedule { date: day, method: ISNA, times, source: SourceLayer::LocalCalculation };

        let store = InMemoryOverrideStore::new();
        store.create_override(day, prayer, &format!("{:02}:{:02}", hour, minute), "").unwrap();
        let hijri = to_hijri(day, 0).unwrap();
        let schedule = merge(
            &raw,
            &location,
            &store.overrides_for(day),
            &store.iqamah(),
            &store.tarawih(),
            hijri,
            qibla_bearing(&location),
        );

        let slot = schedule.slot(prayer);
        prop_assert_eq!(&slot.source, &SourceLayer::ManualOverride);
        prop_assert_eq!(slot.adhan.time(), NaiveTime::from_hms_opt(hour, minute, 0).unwrap());
        prop_assert_eq!(slot.adhan.date_naive(), day);
        prop_assert_eq!(slot.adhan.second(), 0);
        for slot in schedule.slots() {
            if let Some(iqamah) = slot.iqamah {
                prop_assert!(iqamah >= slot.adhan);
            }
        }
    }
}
