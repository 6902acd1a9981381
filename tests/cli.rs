use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn paymatch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("paymatch").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) {
    paymatch(home).args(args).assert().success();
}

fn setup() -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("books");
    paymatch(home.path())
        .args(["init", "--data-dir", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized paymatch"));

    run(home.path(), &["clients", "add", "ABC"]);
    run(home.path(), &["clients", "add", "XYZ", "--contact", "010-1234-5678"]);
    run(home.path(), &["clients", "add", "XYZ 영업팀", "--parent", "XYZ"]);
    home
}

fn write_deposits(home: &Path) -> String {
    let path = home.join("deposits.csv");
    std::fs::write(
        &path,
        "date,description,depositor,amount,balance\n\
         2024-01-05,입금,ABC 홍길동,50000,\n\
         2024-03-15,입금,XYZ,50000,\n\
         2024-04-10,입금,엑스와이지,60000,\n",
    )
    .unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_sub_client_cannot_have_children() {
    let home = setup();
    paymatch(home.path())
        .args(["clients", "add", "XYZ 영업1팀", "--parent", "XYZ 영업팀"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot have sub-clients"));

    paymatch(home.path())
        .args(["clients", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("XYZ 영업팀").and(predicate::str::contains("010-1234-5678")));
}

#[test]
fn test_order_prices_include_vat() {
    let home = setup();
    paymatch(home.path())
        .args(["orders", "add", "--client", "ABC", "--title", "Business cards", "--supply", "10000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("₩11,000").and(predicate::str::contains("VAT ₩1,000")));

    paymatch(home.path())
        .args(["orders", "add", "--client", "Nobody", "--title", "Flyers", "--total", "5000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nobody"));

    paymatch(home.path())
        .args(["orders", "add", "--title", "Billboard", "--supply", "9000000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_init_creates_only_the_database() {
    let home = setup();
    let data = home.path().join("books");
    let entries: Vec<String> = std::fs::read_dir(&data)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with("paymatch.db"))
        .collect();
    assert!(entries.is_empty(), "unexpected entries: {entries:?}");
}

#[test]
fn test_reconcile_apply_then_manual_split() {
    let home = setup();
    let h = home.path();
    run(h, &["orders", "add", "--client", "ABC", "--title", "Catalog", "--total", "50000", "--no-vat", "--date", "2024-01-01"]);
    run(h, &["orders", "add", "--client", "XYZ 영업팀", "--title", "Banner", "--total", "30000", "--no-vat", "--date", "2024-03-01"]);
    run(h, &["orders", "add", "--client", "XYZ", "--title", "Poster", "--total", "20000", "--no-vat", "--date", "2024-03-02"]);

    let csv = write_deposits(h);
    paymatch(h)
        .args(["deposits", "import", &csv])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 deposits imported"));
    paymatch(h)
        .args(["deposits", "import", &csv])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));

    paymatch(h)
        .args(["reconcile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Single matches").and(predicate::str::contains("Group matches")))
        .stdout(predicate::str::contains("--apply"));

    paymatch(h)
        .args(["reconcile", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied: 3 orders marked completed, 2 deposits matched"));

    paymatch(h)
        .args(["reconcile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found."));

    run(h, &["orders", "add", "--client", "XYZ 영업팀", "--title", "Brochure", "--total", "25000", "--no-vat", "--date", "2024-04-01"]);
    run(h, &["orders", "add", "--client", "XYZ", "--title", "Stickers", "--total", "34000", "--no-vat", "--date", "2024-04-02"]);

    paymatch(h)
        .args(["match-group", "--deposit", "3", "--order", "4", "--order", "5"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("-₩1,000"))
        .stderr(predicate::str::contains("difference -1000"));

    run(h, &["orders", "add", "--client", "XYZ", "--title", "Envelopes", "--total", "1000", "--no-vat", "--date", "2024-04-03"]);
    paymatch(h)
        .args(["match-group", "--deposit", "3", "--order", "4", "--order", "5", "--order", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Match for XYZ is balanced"));
    paymatch(h)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unmatched deposits:  1"));

    paymatch(h)
        .args(["match-group", "--deposit", "3", "--order", "4", "--order", "5", "--order", "6", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied: 3 orders paid by deposit 3"));

    paymatch(h)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Outstanding orders:  0"))
        .stdout(predicate::str::contains("Unmatched deposits:  0"));
}

#[test]
fn test_reconcile_json_lists_proposals() {
    let home = setup();
    let h = home.path();
    run(h, &["orders", "add", "--client", "ABC", "--title", "Catalog", "--total", "50000", "--no-vat"]);
    let csv = write_deposits(h);
    run(h, &["deposits", "import", &csv, "--format", "normalized"]);

    let out = paymatch(h).args(["reconcile", "--json"]).output().unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["matches"].as_array().unwrap().len(), 1);
    assert_eq!(value["matches"][0]["record"]["depositor"], "ABC 홍길동");
    assert_eq!(value["matches"][0]["kind"], "exact");
    assert!(value["group_matches"].as_array().unwrap().is_empty());
}

#[test]
fn test_status_before_init() {
    let home = tempfile::tempdir().unwrap();
    paymatch(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run `paymatch init`"));
}

#[test]
fn test_init_vat_rate_applies_to_new_orders() {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("books");
    let data = data.to_str().unwrap();
    paymatch(home.path())
        .args(["init", "--data-dir", data, "--vat-rate", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 100"));

    paymatch(home.path())
        .args(["init", "--data-dir", data, "--vat-rate", "0", "--business-name", "블루인쇄"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VAT rate: 0%"));
    paymatch(home.path())
        .args(["orders", "add", "--title", "Leaflets", "--supply", "10000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("₩10,000 (supply ₩10,000, VAT ₩0)"));
    paymatch(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("블루인쇄"));
}
