//! Fixture generator: writes a directory of Telegram Desktop style exports
//! plus a matching `links.txt`, for trying chatgrep without a live account.
//!
//! Usage: cargo run --features gen-test --bin gen_test -- [groups] [messages] [dir]
//! Example: cargo run --features gen-test --bin gen_test -- 5 20000 exports

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

const KEYWORDS: &[&str] = &["hiring", "rust", "remote", "продам", "куплю"];

const FILLER: &[&str] = &[
    "good morning everyone",
    "has anyone tried the new release?",
    "link in bio",
    "thanks, that worked",
    "Всем привет",
    "see the pinned message",
    "+1",
    "😂😂😂",
    "can someone review my PR",
    "what time is the meetup",
];

const SENDERS: &[(&str, &str)] = &[
    ("user1001", "Alice Smith"),
    ("user1002", "Bob"),
    ("user1003", "Иван Петров"),
    ("user1004", "Мария"),
    ("user1005", "村上"),
    ("user1006", "User;With;Semicolons"),
    ("user1007", "User \"Quoted\""),
    ("channel2001", "Announcements"),
];

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let groups: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3);
    let messages: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5_000);
    let dir = args.get(3).map_or("exports", String::as_str);

    println!("🧪 Export Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Groups:   {}", groups);
    println!("   Messages: {} per group", messages);
    println!("   Output:   {}", dir);
    println!();

    let dir = Path::new(dir);
    fs::create_dir_all(dir)?;

    let start = std::time::Instant::now();
    let mut rng = rand::thread_rng();
    let mut links = Vec::with_capacity(groups + 1);

    for g in 0..groups {
        let username = format!("test_group_{}", g + 1);
        let export = generate_group(&mut rng, g as i64 + 1, &username, messages);
        write_json(&dir.join(format!("{}.json", username)), &export)?;
        links.push(format!("https://t.me/{}", username));
        eprint!("\r   Generated {}/{} groups", g + 1, groups);
    }

    // One group reachable only through an invite link
    let invite = generate_group(&mut rng, 9_999, "private", messages / 10);
    write_json(&dir.join("invite_TestInviteHash.json"), &invite)?;
    links.push("https://t.me/+TestInviteHash".to_string());
    links.push("@missing_group".to_string());

    fs::write(dir.join("links.txt"), links.join("\n") + "\n")?;

    println!("\n\n✅ Done!");
    println!("   Links: {}", dir.join("links.txt").display());
    println!("   Time:  {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn generate_group(rng: &mut impl Rng, id: i64, name: &str, count: u64) -> Value {
    let mut date: u64 = 1_700_000_000;
    let messages: Vec<Value> = (1..=count)
        .map(|i| {
            date += rng.gen_range(30..600);
            if rng.gen_bool(0.02) {
                return json!({
                    "id": i,
                    "type": "service",
                    "date_unixtime": date.to_string(),
                    "action": "pin_message",
                });
            }

            let (from_id, from) = SENDERS.choose(rng).copied().unwrap_or(SENDERS[0]);
            let mut msg = json!({
                "id": i,
                "type": "message",
                "date_unixtime": date.to_string(),
                "from": from,
                "from_id": from_id,
                "text": generate_text(rng),
                "views": rng.gen_range(0..5_000),
                "forwards": rng.gen_range(0..50),
                "replies": rng.gen_range(0..20),
                "reactions": [{"type": "emoji", "count": rng.gen_range(1..30), "emoji": "👍"}],
            });
            if rng.gen_bool(0.05) {
                // Media-only message
                msg["text"] = json!("");
                msg["photo"] = json!("photos/photo_1.jpg");
            }
            msg
        })
        .collect();

    json!({
        "name": format!("Test {}", name),
        "type": "public_supergroup",
        "id": id,
        "messages": messages,
    })
}

fn generate_text(rng: &mut impl Rng) -> Value {
    let filler = FILLER.choose(rng).copied().unwrap_or("hello");
    if !rng.gen_bool(0.1) {
        return json!(filler);
    }

    let keyword = KEYWORDS.choose(rng).copied().unwrap_or("rust");
    let keyword = if rng.gen_bool(0.5) { keyword.to_uppercase() } else { keyword.to_string() };
    if rng.gen_bool(0.3) {
        // Entity array, as exports store formatted text
        json!([filler, " ", {"type": "bold", "text": keyword}, " details inside"])
    } else {
        json!(format!("{} {} {}", filler, keyword, filler))
    }
}

fn write_json(path: &Path, value: &Value) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(1024 * 1024, File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()
}
