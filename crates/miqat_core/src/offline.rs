//! Bundled emergency schedule.
//!
//! Typical prayer times for each 15° latitude band and calendar month, in
//! minutes of local mean solar time after midnight. Values were taken at
//! mid-month with Muslim World League angles and angle-based high-latitude
//! adjustment. Only used when the calculator itself cannot run.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use miqat_types::{CalculationMethod, Location, RawSchedule, RawTimes, SourceLayer};

/// Southernmost band centre; bands step by [`BAND_DEGREES`] up to 60°N.
const FIRST_BAND: f64 = -60.0;
const BAND_DEGREES: f64 = 15.0;

/// Minutes after local mean midnight: fajr, sunrise, dhuhr, asr, maghrib, isha.
type DayMinutes = [u16; 6];

#[rustfmt::skip]
static TABLE: [[DayMinutes; 12]; 9] = [
    // -60
    [[82,192,729,1002,1265,1369],[118,276,734,974,1191,1340],[197,348,729,924,1108,1248],[284,423,720,856,1016,1147],[343,494,716,799,938,1081],[377,543,721,773,898,1055],[370,528,726,792,925,1074],[317,459,724,839,991,1125],[227,369,715,888,1063,1196],[103,278,706,930,1135,1300],[69,194,705,969,1217,1335],[58,151,715,997,1280,1368]],
    // -45
    [[135,273,729,975,1185,1312],[205,318,734,965,1150,1254],[256,356,729,937,1101,1194],[297,395,720,895,1044,1136],[329,431,716,860,1001,1098],[350,457,721,847,984,1085],[349,453,726,860,999,1098],[318,417,724,887,1032,1126],[264,362,715,911,1069,1161],[200,306,706,929,1106,1206],[134,261,705,947,1149,1268],[96,247,715,964,1183,1323]],
    // -30
    [[220,314,729,946,1145,1232],[255,341,734,950,1127,1207],[280,360,729,938,1097,1172],[299,379,720,914,1060,1136],[315,398,716,894,1035,1113],[328,414,721,889,1027,1108],[330,414,726,899,1038,1117],[313,393,724,912,1056,1132],[279,358,715,919,1073,1147],[239,322,706,920,1090,1168],[206,296,705,921,1114,1199],[197,293,715,931,1137,1228]],
    // -15
    [[263,342,729,930,1117,1191],[283,357,734,925,1111,1181],[292,363,729,929,1094,1161],[295,367,720,921,1073,1140],[299,374,716,913,1059,1129],[307,383,721,914,1058,1130],[311,386,726,921,1066,1137],[304,376,724,924,1073,1141],[284,355,715,916,1076,1143],[260,333,706,900,1079,1147],[243,320,705,900,1089,1162],[245,325,715,920,1106,1181]],
    // 0
    [[292,366,729,934,1093,1163],[300,371,734,932,1097,1164],[297,366,729,912,1092,1157],[287,357,720,915,1083,1149],[280,353,716,920,1080,1148],[282,357,721,926,1084,1155],[288,362,726,931,1090,1159],[290,361,724,924,1088,1154],[283,352,715,900,1078,1143],[273,342,706,900,1069,1134],[268,341,705,908,1068,1137],[276,351,715,921,1079,1150]],
    // 15
    [[314,389,729,925,1070,1141],[312,384,734,934,1084,1152],[297,368,729,930,1090,1157],[273,346,720,913,1094,1163],[254,332,716,913,1101,1174],[250,330,721,926,1111,1186],[259,338,726,927,1114,1188],[271,346,724,913,1103,1173],[277,349,715,914,1081,1149],[280,352,706,907,1060,1127],[287,362,705,902,1048,1118],[301,378,715,909,1053,1125]],
    // 30
    [[333,417,729,903,1043,1122],[319,400,734,924,1069,1145],[290,370,729,934,1088,1163],[250,333,720,935,1107,1186],[216,307,716,933,1127,1212],[202,299,721,936,1143,1233],[215,309,726,942,1143,1230],[241,327,724,941,1121,1202],[264,345,715,925,1085,1161],[282,362,706,902,1049,1124],[302,385,705,883,1024,1102],[323,408,715,884,1022,1103]],
    // 45
    [[350,455,729,865,1005,1103],[322,421,734,901,1048,1141],[274,372,729,927,1086,1179],[208,315,720,946,1126,1227],[142,271,716,959,1163,1283],[101,253,721,970,1189,1328],[127,268,726,972,1184,1313],[187,302,724,958,1146,1253],[238,339,715,925,1091,1185],[278,376,706,884,1035,1127],[316,418,705,850,991,1087],[345,451,715,841,979,1080]],
    // 60
    [[371,527,729,798,932,1081],[317,457,734,856,1012,1144],[234,376,729,906,1083,1217],[114,283,720,950,1159,1319],[79,202,716,982,1232,1348],[63,156,721,1002,1285,1373],[77,184,726,1000,1267,1368],[104,255,724,970,1193,1335],[175,328,715,914,1101,1242],[261,400,706,848,1011,1141],[328,478,705,789,930,1072],[372,537,715,768,893,1050]],
];

fn band_index(lat: f64) -> usize {
    let index = ((lat - FIRST_BAND) / BAND_DEGREES).round();
    index.clamp(0.0, (TABLE.len() - 1) as f64) as usize
}

/// Typical times for the location's latitude band and the date's month,
/// shifted to UTC by longitude. Always succeeds.
pub fn offline_schedule(location: &Location, date: NaiveDate, method: CalculationMethod) -> RawSchedule {
    let row = TABLE[band_index(location.lat)][date.month0() as usize];
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let shift = (location.lng / 15.0 * 60.0).round() as i64;
    let at = |minutes: u16| -> DateTime<Utc> { midnight + Duration::minutes(i64::from(minutes) - shift) };

    let [fajr, sunrise, dhuhr, asr, maghrib, isha] = row.map(at);
    let night = (sunrise + Duration::days(1)) - maghrib;
    let times = RawTimes {
        imsak: fajr - Duration::minutes(10),
        fajr,
        sunrise,
        dhuhr,
        asr,
        sunset: maghrib,
        maghrib,
        isha,
        midnight: maghrib + night / 2,
    };

    RawSchedule { date, method, times, source: SourceLayer::OfflineSchedule }
}
