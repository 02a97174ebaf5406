//! Redis storage backend
//!
//! Key layout:
//! - `role:{principal}` / `profile:{principal}`: role string / profile JSON
//! - `entry:{id}`: entry JSON as seeded, `entry_prize:{prize_number}` -> id
//! - `entry_activation:{id}`: activation JSON, written once with `SET NX`
//! - `claim:{id}`: hash with `record` (JSON), `status`, `admin_response`
//! - `testimonial:{name}`: testimonial JSON
//! - `entries:all`, `claims:all`, `testimonials:all`: insertion-order lists
//!
//! Every write that touches a record and its order list runs as one Lua
//! script, so the two never diverge.

use anyhow::Context;
use async_trait::async_trait;
use portal_common::{
    Activation, ClaimStatus, Error, Principal, Result, Testimonial, UserProfile, UserRole,
    WinnerClaim, WinningEntry,
};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{ActivationOutcome, EntryInsert, Storage};

const ENTRY_INDEX: &str = "entries:all";
const CLAIM_INDEX: &str = "claims:all";
const TESTIMONIAL_INDEX: &str = "testimonials:all";

const CLAIM_RECORD_FIELD: &str = "record";
const CLAIM_STATUS_FIELD: &str = "status";
const CLAIM_RESPONSE_FIELD: &str = "admin_response";

fn role_key(principal: &Principal) -> String {
    format!("role:{}", principal)
}

fn profile_key(principal: &Principal) -> String {
    format!("profile:{}", principal)
}

fn entry_key(id: &str) -> String {
    format!("entry:{}", id)
}

fn activation_key(id: &str) -> String {
    format!("entry_activation:{}", id)
}

fn prize_key(prize_number: &str) -> String {
    format!("entry_prize:{}", prize_number)
}

fn claim_key(id: &str) -> String {
    format!("claim:{}", id)
}

fn testimonial_key(name: &str) -> String {
    format!("testimonial:{}", name)
}

fn redis_err(e: RedisError) -> Error {
    Error::Redis(e.to_string())
}

// KEYS: entry, prize binding, entry index. ARGV: id, entry JSON.
// Returns 0 inserted, 1 duplicate id, 2 prize number bound to another id.
const INSERT_ENTRY_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 1
end
local owner = redis.call('GET', KEYS[2])
if owner and owner ~= ARGV[1] then
    return 2
end
redis.call('SET', KEYS[2], ARGV[1])
redis.call('SET', KEYS[1], ARGV[2])
redis.call('RPUSH', KEYS[3], ARGV[1])
return 0
"#;

// KEYS: claim hash, claim index. ARGV: record field, claim JSON, id.
const INSERT_CLAIM_SCRIPT: &str = r#"
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 0 then
    return 0
end
redis.call('RPUSH', KEYS[2], ARGV[3])
return 1
"#;

// KEYS: testimonial, testimonial index. ARGV: name, testimonial JSON.
// A name already in the index keeps its position.
const UPSERT_TESTIMONIAL_SCRIPT: &str = r#"
redis.call('SET', KEYS[1], ARGV[2])
if not redis.call('LPOS', KEYS[2], ARGV[1]) then
    redis.call('RPUSH', KEYS[2], ARGV[1])
end
return 1
"#;

// KEYS: testimonial, testimonial index. ARGV: name.
const REMOVE_TESTIMONIAL_SCRIPT: &str = r#"
local removed = redis.call('DEL', KEYS[1])
redis.call('LREM', KEYS[2], 0, ARGV[1])
return removed
"#;

/// Rebuild a claim from its hash fields; `None` when the record is absent
fn decode_claim(fields: &HashMap<String, String>) -> Result<Option<WinnerClaim>> {
    let Some(record) = fields.get(CLAIM_RECORD_FIELD) else {
        return Ok(None);
    };

    let mut claim: WinnerClaim = serde_json::from_str(record)?;
    if let Some(raw) = fields.get(CLAIM_STATUS_FIELD) {
        claim.status = ClaimStatus::parse(raw).ok_or_else(|| {
            Error::Other(anyhow::anyhow!("Unknown stored claim status: {}", raw))
        })?;
    }
    if let Some(response) = fields.get(CLAIM_RESPONSE_FIELD) {
        claim.admin_response = Some(response.clone());
    }

    Ok(Some(claim))
}

struct Scripts {
    insert_entry: Script,
    insert_claim: Script,
    upsert_testimonial: Script,
    remove_testimonial: Script,
}

impl Scripts {
    fn new() -> Self {
        Self {
            insert_entry: Script::new(INSERT_ENTRY_SCRIPT),
            insert_claim: Script::new(INSERT_CLAIM_SCRIPT),
            upsert_testimonial: Script::new(UPSERT_TESTIMONIAL_SCRIPT),
            remove_testimonial: Script::new(REMOVE_TESTIMONIAL_SCRIPT),
        }
    }
}

/// Storage backed by a shared Redis instance
pub struct RedisStorage {
    conn: ConnectionManager,
    scripts: Scripts,
}

impl RedisStorage {
    /// Create a new storage instance
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        // The URL may carry credentials
        info!("Connected to Redis");

        Ok(Self {
            conn,
            scripts: Scripts::new(),
        })
    }

    // ConnectionManager multiplexes; clones share one connection
    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let json: Option<String> = self.conn().get(key).await.map_err(redis_err)?;
        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get_role(&self, principal: &Principal) -> Result<Option<UserRole>> {
        let value: Option<String> = self
            .conn()
            .get(role_key(principal))
            .await
            .map_err(redis_err)?;

        match value {
            Some(s) => UserRole::parse(&s)
                .map(Some)
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Unknown stored role: {}", s))),
            None => Ok(None),
        }
    }

    async fn set_role(&self, principal: &Principal, role: UserRole) -> Result<()> {
        self.conn()
            .set::<_, _, ()>(role_key(principal), role.as_str())
            .await
            .map_err(redis_err)
    }

    async fn get_profile(&self, principal: &Principal) -> Result<Option<UserProfile>> {
        self.get_json(&profile_key(principal)).await
    }

    async fn put_profile(&self, principal: &Principal, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        self.conn()
            .set::<_, _, ()>(profile_key(principal), json)
            .await
            .map_err(redis_err)
    }

    async fn insert_entry(&self, entry: &WinningEntry) -> Result<EntryInsert> {
        let json = serde_json::to_string(entry)?;

        let code: i64 = self
            .scripts
            .insert_entry
            .key(entry_key(&entry.id))
            .key(prize_key(&entry.prize_number))
            .key(ENTRY_INDEX)
            .arg(&entry.id)
            .arg(json)
            .invoke_async(&mut self.conn())
            .await
            .map_err(redis_err)?;

        match code {
            0 => Ok(EntryInsert::Inserted),
            1 => {
                debug!("Entry already exists: {}", entry.id);
                Ok(EntryInsert::DuplicateId)
            }
            _ => Ok(EntryInsert::DuplicatePrizeNumber),
        }
    }

    async fn get_entry(&self, id: &str) -> Result<Option<WinningEntry>> {
        let (base, activation): (Option<String>, Option<String>) = redis::cmd("MGET")
            .arg(entry_key(id))
            .arg(activation_key(id))
            .query_async(&mut self.conn())
            .await
            .map_err(redis_err)?;

        let Some(base) = base else {
            return Ok(None);
        };

        let entry: WinningEntry = serde_json::from_str(&base)?;
        let activation: Option<Activation> = match activation {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(Some(entry.with_activation(activation)))
    }

    async fn find_entry_by_prize_number(
        &self,
        prize_number: &str,
    ) -> Result<Option<WinningEntry>> {
        let id: Option<String> = self
            .conn()
            .get(prize_key(prize_number))
            .await
            .map_err(redis_err)?;

        match id {
            Some(id) => self.get_entry(&id).await,
            None => Ok(None),
        }
    }

    async fn list_entries(&self) -> Result<Vec<WinningEntry>> {
        let ids: Vec<String> = self
            .conn()
            .lrange(ENTRY_INDEX, 0, -1)
            .await
            .map_err(redis_err)?;

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = self.get_entry(&id).await? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn activate_entry(
        &self,
        id: &str,
        activation: Activation,
    ) -> Result<ActivationOutcome> {
        let mut conn = self.conn();

        // The base record never changes after seeding, so it can be read first
        let base: Option<String> = conn.get(entry_key(id)).await.map_err(redis_err)?;
        let Some(base) = base else {
            return Ok(ActivationOutcome::NotFound);
        };
        let entry: WinningEntry = serde_json::from_str(&base)?;

        // SET NX is the single check-and-set step: claimant and timestamp are
        // written together or not at all
        let json = serde_json::to_string(&activation)?;
        let won: bool = conn
            .set_nx(activation_key(id), json)
            .await
            .map_err(redis_err)?;

        if !won {
            return Ok(ActivationOutcome::AlreadyClaimed);
        }

        Ok(ActivationOutcome::Activated(
            entry.with_activation(Some(activation)),
        ))
    }

    async fn insert_claim(&self, claim: &WinnerClaim) -> Result<bool> {
        let json = serde_json::to_string(claim)?;

        let created: i64 = self
            .scripts
            .insert_claim
            .key(claim_key(&claim.id))
            .key(CLAIM_INDEX)
            .arg(CLAIM_RECORD_FIELD)
            .arg(json)
            .arg(&claim.id)
            .invoke_async(&mut self.conn())
            .await
            .map_err(redis_err)?;

        Ok(created == 1)
    }

    async fn get_claim(&self, id: &str) -> Result<Option<WinnerClaim>> {
        let fields: HashMap<String, String> = self
            .conn()
            .hgetall(claim_key(id))
            .await
            .map_err(redis_err)?;

        decode_claim(&fields)
    }

    async fn list_claims(&self) -> Result<Vec<WinnerClaim>> {
        let ids: Vec<String> = self
            .conn()
            .lrange(CLAIM_INDEX, 0, -1)
            .await
            .map_err(redis_err)?;

        let mut claims = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(claim) = self.get_claim(&id).await? {
                claims.push(claim);
            }
        }
        Ok(claims)
    }

    async fn set_claim_status(&self, id: &str, status: ClaimStatus) -> Result<bool> {
        let mut conn = self.conn();
        let key = claim_key(id);

        let exists: bool = conn
            .hexists(&key, CLAIM_RECORD_FIELD)
            .await
            .map_err(redis_err)?;
        if !exists {
            return Ok(false);
        }

        conn.hset::<_, _, _, ()>(&key, CLAIM_STATUS_FIELD, status.as_str())
            .await
            .map_err(redis_err)?;
        Ok(true)
    }

    async fn set_admin_response(&self, id: &str, response: &str) -> Result<bool> {
        let mut conn = self.conn();
        let key = claim_key(id);

        let exists: bool = conn
            .hexists(&key, CLAIM_RECORD_FIELD)
            .await
            .map_err(redis_err)?;
        if !exists {
            return Ok(false);
        }

        conn.hset::<_, _, _, ()>(&key, CLAIM_RESPONSE_FIELD, response)
            .await
            .map_err(redis_err)?;
        Ok(true)
    }

    async fn upsert_testimonial(&self, testimonial: &Testimonial) -> Result<()> {
        let json = serde_json::to_string(testimonial)?;

        self.scripts
            .upsert_testimonial
            .key(testimonial_key(&testimonial.name))
            .key(TESTIMONIAL_INDEX)
            .arg(&testimonial.name)
            .arg(json)
            .invoke_async::<_, ()>(&mut self.conn())
            .await
            .map_err(redis_err)
    }

    async fn remove_testimonial(&self, name: &str) -> Result<bool> {
        let removed: i64 = self
            .scripts
            .remove_testimonial
            .key(testimonial_key(name))
            .key(TESTIMONIAL_INDEX)
            .arg(name)
            .invoke_async(&mut self.conn())
            .await
            .map_err(redis_err)?;

        Ok(removed > 0)
    }

    async fn list_testimonials(&self) -> Result<Vec<Testimonial>> {
        let names: Vec<String> = self
            .conn()
            .lrange(TESTIMONIAL_INDEX, 0, -1)
            .await
            .map_err(redis_err)?;

        let mut testimonials = Vec::with_capacity(names.len());
        for name in names {
            if let Some(testimonial) = self.get_json(&testimonial_key(&name)).await? {
                testimonials.push(testimonial);
            }
        }
        Ok(testimonials)
    }
}
