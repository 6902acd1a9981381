use crate::db::{get_connection, DB_FILE};
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!(
        "Business:   {}",
        if settings.business_name.is_empty() { "(not set)" } else { &settings.business_name }
    );
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("VAT rate:   {}%", settings.vat_rate_percent);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let clients: i64 = conn.query_row("SELECT count(*) FROM clients", [], |r| r.get(0))?;
        let (open_orders, open_total): (i64, i64) = conn.query_row(
            "SELECT count(*), COALESCE(SUM(amount), 0) FROM transactions \
             WHERE status NOT IN ('completed', 'card') AND paid_at IS NULL",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let (open_deposits, deposit_total): (i64, i64) = conn.query_row(
            "SELECT count(*), COALESCE(SUM(amount), 0) FROM bank_records WHERE is_matched = 0",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        println!();
        println!("Clients:             {clients}");
        println!("Outstanding orders:  {open_orders} ({})", money(open_total));
        println!("Unmatched deposits:  {open_deposits} ({})", money(deposit_total));
    } else {
        println!();
        println!("Database not found. Run `paymatch init` to set up.");
    }

    Ok(())
}
