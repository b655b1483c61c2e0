use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::OrderNumber;

/// Generates a fresh human-displayable order number, e.g. `BK-20240521-7GK2QD`.
///
/// The date component keeps numbers roughly sortable for humans; the random suffix plus the
/// unique constraint on the column guard against collisions.
pub fn new_order_number() -> OrderNumber {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(6).map(|c| (c as char).to_ascii_uppercase()).collect();
    OrderNumber(format!("BK-{date}-{suffix}"))
}
