//! Voucher batches: random hotspot logins created in one router session.

use std::collections::HashSet;

use rand::Rng;
use rcg_01_router_protocol::{HotspotUserParams, RouterConnection, RouterResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::validation::schemas::VoucherBatchInput;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How voucher credentials are formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoucherMode {
    /// Separate random password.
    #[default]
    UserPass,
    /// Password equals the user name.
    UserOnly,
}

/// One created voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voucher {
    pub id: String,
    pub name: String,
    pub password: String,
}

fn random_code<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// `quantity` distinct codes of `prefix` followed by `length` random characters.
pub fn generate_codes<R: Rng>(rng: &mut R, quantity: usize, length: usize, prefix: &str) -> Vec<String> {
    let mut seen = HashSet::with_capacity(quantity);
    let mut codes = Vec::with_capacity(quantity);
    while codes.len() < quantity {
        let code = format!("{prefix}{}", random_code(rng, length));
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

/// Hotspot users for a validated batch request.
pub fn plan<R: Rng>(rng: &mut R, input: &VoucherBatchInput) -> Vec<HotspotUserParams> {
    generate_codes(rng, input.quantity, input.length, &input.prefix)
        .into_iter()
        .map(|name| {
            let password = match input.mode {
                VoucherMode::UserOnly => name.clone(),
                VoucherMode::UserPass => random_code(rng, input.length),
            };
            HotspotUserParams {
                name: Some(name),
                password: Some(password),
                profile: Some(input.profile.clone()),
                server: input.server.clone(),
                limit_uptime: input.limit_uptime.clone(),
                comment: input.comment.clone(),
                ..Default::default()
            }
        })
        .collect()
}

/// Add every planned user, serially, on `conn`.
///
/// Stops at the first router error; users added before it stay on the
/// router.
pub async fn create_batch(
    conn: &mut RouterConnection,
    users: Vec<HotspotUserParams>,
) -> RouterResult<Vec<Voucher>> {
    let mut created = Vec::with_capacity(users.len());
    for user in users {
        let id = conn.hotspot_users().add(&user).await?;
        created.push(Voucher {
            id,
            name: user.name.unwrap_or_default(),
            password: user.password.unwrap_or_default(),
        });
    }
    info!(count = created.len(), "voucher batch created");
    Ok(created)
}
