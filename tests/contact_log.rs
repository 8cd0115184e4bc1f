use chrono::{Local, TimeZone};
use storefront_api::services::contact_service::{append_line, format_contact_line};

#[test]
fn line_has_timestamp_name_phone_and_message() {
    let at = Local
        .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
        .single()
        .expect("unambiguous local time");
    let line = format_contact_line(at, "Jane", "+1 555 0100", "Hello\nthere");
    assert_eq!(
        line,
        "2024-03-05 14:07:09.000000 - Jane (+1 555 0100): Hello there\n"
    );
}

#[tokio::test]
async fn append_keeps_earlier_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("messages.txt");
    let path = path.to_str().unwrap();

    append_line(path, "first\n").await.unwrap();
    append_line(path, "second\n").await.unwrap();

    let contents = tokio::fs::read_to_string(path).await.unwrap();
    assert_eq!(contents, "first\nsecond\n");
}
