use super::*;

const LOG_LINE: &str = r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":"8"}"#;

const SONG_LINE: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

#[test]
fn test_parse_log_line() {
    let event: RawEvent = serde_json::from_str(LOG_LINE).unwrap();
    assert_eq!(event.ts, Some(1541106106796));
    assert_eq!(event.user_id, Some(8));
    assert_eq!(event.session_id, Some(139));
    assert_eq!(event.first_name.as_deref(), Some("Kaylee"));
    assert_eq!(event.length, Some(246.30812));
    assert!(event.is_play("NextSong"));
    assert!(!event.is_play("Home"));
}

#[test]
fn test_empty_user_id_is_absent() {
    let event: RawEvent =
        serde_json::from_str(r#"{"page":"Home","ts":1541106106796,"userId":""}"#).unwrap();
    assert_eq!(event.user_id, None);
}

#[test]
fn test_numeric_user_id() {
    let event: RawEvent =
        serde_json::from_str(r#"{"page":"NextSong","ts":1541106106796,"userId":26}"#).unwrap();
    assert_eq!(event.user_id, Some(26));
}

#[test]
fn test_garbage_user_id_is_error() {
    let result: Result<RawEvent, _> =
        serde_json::from_str(r#"{"page":"NextSong","ts":1,"userId":"abc"}"#);
    assert!(result.is_err());
}

#[test]
fn test_parse_song_line() {
    let song: RawSongMetadata = serde_json::from_str(SONG_LINE).unwrap();
    assert_eq!(song.song_id.as_deref(), Some("SOMZWCG12A8C13C480"));
    assert_eq!(song.artist_latitude, None);
    assert_eq!(song.year, Some(0));
    assert!(song.has_keys());
}

#[test]
fn test_song_without_artist_id_has_no_keys() {
    let song = RawSongMetadata {
        song_id: Some("S1".into()),
        artist_id: Some("  ".into()),
        ..Default::default()
    };
    assert!(!song.has_keys());
}

#[test]
fn test_play_event_from_raw() {
    let event: RawEvent = serde_json::from_str(LOG_LINE).unwrap();
    let play = PlayEvent::from_raw(event).unwrap();
    assert_eq!(
        play.start_time.to_string(),
        "2018-11-01 21:01:46.796"
    );
    assert_eq!(play.user_id, Some(8));
    assert_eq!(play.song.as_deref(), Some("You Gotta Be"));
}

#[test]
fn test_play_event_requires_timestamp() {
    let event = RawEvent {
        page: Some("NextSong".into()),
        ..Default::default()
    };
    assert!(PlayEvent::from_raw(event).is_none());
}
