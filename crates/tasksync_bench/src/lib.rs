//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::distributions::Alphanumeric;
use rand::Rng;
use tasksync_protocol::{RemoteChangeRecord, SyncAction};

/// Generates a random alphanumeric string.
pub fn random_text(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Builds a VCALENDAR with one VTODO whose description is `description_len`
/// characters, folded at 75 octets.
pub fn vtodo(uid: &str, description_len: usize) -> Vec<u8> {
    let description = format!("DESCRIPTION:{}", random_text(description_len));
    let mut folded = String::new();
    for (i, chunk) in description.as_bytes().chunks(74).enumerate() {
        if i > 0 {
            folded.push_str("\r\n ");
        }
        folded.push_str(&String::from_utf8_lossy(chunk));
    }

    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTODO\r\nUID:{uid}\r\nSUMMARY:{}\r\n{folded}\r\nPRIORITY:5\r\nCATEGORIES:work,home\r\nEND:VTODO\r\nEND:VCALENDAR\r\n",
        random_text(24)
    )
    .into_bytes()
}

/// Builds `count` current-protocol items touching `distinct` task UIDs.
pub fn item_feed(count: usize, distinct: usize) -> Vec<RemoteChangeRecord> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let uid = format!("task-{}", rng.gen_range(0..distinct.max(1)));
            RemoteChangeRecord::item(uid.clone(), format!("etag-{i}"), vtodo(&uid, 200), false)
        })
        .collect()
}

/// Builds `count` legacy entries touching `distinct` task UIDs.
pub fn entry_feed(count: usize, distinct: usize) -> Vec<RemoteChangeRecord> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let uid = format!("task-{}", rng.gen_range(0..distinct.max(1)));
            RemoteChangeRecord::entry(SyncAction::Change, vtodo(&uid, 200))
        })
        .collect()
}
