//! Durable profile storage on redb
//!
//! All methods are blocking; handlers call them from `spawn_blocking`.

use redb::{ReadableDatabase, ReadableTable};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::ms_to_rfc3339;
use crate::db::{tables, Db};
use crate::error::{AppError, Result};
use crate::models::{
    Gender, MeasurementUpdate, MeasurementsRecord, ProfileRecord, PublicProfile,
};
use crate::security::ShareToken;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Input for a new profile; the PIN is already hashed
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub owner_id: String,
    pub display_name: String,
    pub gender: Gender,
    pub share_token: ShareToken,
    pub edit_pin_hash: String,
}

/// Public view of a profile and its measurements
#[derive(Debug, Clone, Serialize)]
pub struct PublicView {
    pub profile: PublicProfile,
    pub measurements: MeasurementsRecord,
}

#[derive(Clone)]
pub struct ProfileStore {
    db: Db,
}

impl ProfileStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a profile with empty measurements
    ///
    /// If the owner already has a profile, its token is returned and nothing
    /// is written.
    pub fn create_profile(&self, new: NewProfile, now: i64) -> Result<ShareToken> {
        let write_txn = self.db.begin_write()?;
        let token = {
            let mut owners = write_txn.open_table(tables::OWNER_PROFILES)?;
            let existing = owners
                .get(new.owner_id.as_str())?
                .map(|guard| guard.value().to_string());
            if let Some(existing) = existing {
                tracing::info!("Owner already has a profile, returning existing token");
                return ShareToken::parse(&existing);
            }

            let mut profiles = write_txn.open_table(tables::PROFILES)?;
            let record = ProfileRecord {
                owner_id: new.owner_id.clone(),
                display_name: new.display_name,
                gender: new.gender,
                edit_pin_hash: new.edit_pin_hash,
                created_at: now,
            };
            let bytes = encode(&record)?;
            profiles.insert(new.share_token.as_str(), bytes.as_slice())?;

            let mut measurements = write_txn.open_table(tables::MEASUREMENTS)?;
            let empty = MeasurementsRecord {
                updated_at: now,
                ..Default::default()
            };
            let bytes = encode(&empty)?;
            measurements.insert(new.share_token.as_str(), bytes.as_slice())?;

            owners.insert(new.owner_id.as_str(), new.share_token.as_str())?;
            new.share_token
        };
        write_txn.commit()?;

        tracing::info!("New profile created");
        Ok(token)
    }

    pub fn find_token_by_owner(&self, owner_id: &str) -> Result<Option<ShareToken>> {
        let read_txn = self.db.begin_read()?;
        let owners = read_txn.open_table(tables::OWNER_PROFILES)?;
        let token = owners.get(owner_id)?.map(|guard| guard.value().to_string());
        token.map(|t| ShareToken::parse(&t)).transpose()
    }

    /// Stored PIN hash for a share token
    pub fn pin_hash(&self, token: &ShareToken) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let profiles = read_txn.open_table(tables::PROFILES)?;
        let record: Option<ProfileRecord> = profiles
            .get(token.as_str())?
            .map(|guard| decode(guard.value()))
            .transpose()?;
        Ok(record.map(|r| r.edit_pin_hash))
    }

    pub fn public_profile(&self, token: &ShareToken) -> Result<Option<PublicView>> {
        let read_txn = self.db.begin_read()?;
        let profiles = read_txn.open_table(tables::PROFILES)?;
        let record: Option<ProfileRecord> = profiles
            .get(token.as_str())?
            .map(|guard| decode(guard.value()))
            .transpose()?;
        let Some(record) = record else {
            return Ok(None);
        };

        let measurements_table = read_txn.open_table(tables::MEASUREMENTS)?;
        let measurements: MeasurementsRecord = measurements_table
            .get(token.as_str())?
            .map(|guard| decode(guard.value()))
            .transpose()?
            .unwrap_or_default();

        Ok(Some(PublicView {
            profile: PublicProfile {
                display_name: record.display_name,
                gender: record.gender,
                created_at: ms_to_rfc3339(record.created_at),
            },
            measurements,
        }))
    }

    /// Apply an update to the measurements of `token`
    ///
    /// Callers must have authorized the edit first.
    pub fn update_measurements(
        &self,
        token: &ShareToken,
        update: &MeasurementUpdate,
        now: i64,
    ) -> Result<MeasurementsRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let profiles = write_txn.open_table(tables::PROFILES)?;
            if profiles.get(token.as_str())?.is_none() {
                return Err(AppError::NotFound);
            }
            drop(profiles);

            let mut table = write_txn.open_table(tables::MEASUREMENTS)?;
            let mut record: MeasurementsRecord = table
                .get(token.as_str())?
                .map(|guard| decode(guard.value()))
                .transpose()?
                .unwrap_or_default();
            record.apply(update, now);

            let bytes = encode(&record)?;
            table.insert(token.as_str(), bytes.as_slice())?;
            record
        };
        write_txn.commit()?;

        Ok(record)
    }

    /// Delete the owner's profile, measurements and index entry
    ///
    /// Returns the deleted profile's token, or `None` if the owner had none.
    pub fn delete_owner(&self, owner_id: &str) -> Result<Option<ShareToken>> {
        let write_txn = self.db.begin_write()?;
        let token = {
            let mut owners = write_txn.open_table(tables::OWNER_PROFILES)?;
            let token = owners
                .remove(owner_id)?
                .map(|guard| guard.value().to_string());
            let Some(token) = token else {
                return Ok(None);
            };

            let mut profiles = write_txn.open_table(tables::PROFILES)?;
            profiles.remove(token.as_str())?;

            let mut measurements = write_txn.open_table(tables::MEASUREMENTS)?;
            measurements.remove(token.as_str())?;
            token
        };
        write_txn.commit()?;

        tracing::info!("Profile and measurements deleted");
        ShareToken::parse(&token).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> ProfileStore {
        let db = open_database(temp_dir.path().join("test.db")).unwrap();
        ProfileStore::new(db)
    }

    fn new_profile(owner: &str) -> NewProfile {
        NewProfile {
            owner_id: owner.to_string(),
            display_name: "Ada".to_string(),
            gender: Gender::Female,
            share_token: ShareToken::generate(),
            edit_pin_hash: "$2b$04$placeholderhash".to_string(),
        }
    }

    #[test]
    fn test_create_and_read_profile() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let token = store.create_profile(new_profile("owner-1"), 1_000).unwrap();

        assert_eq!(store.find_token_by_owner("owner-1").unwrap(), Some(token.clone()));
        assert_eq!(
            store.pin_hash(&token).unwrap().as_deref(),
            Some("$2b$04$placeholderhash")
        );

        let view = store.public_profile(&token).unwrap().unwrap();
        assert_eq!(view.profile.display_name, "Ada");
        assert_eq!(view.measurements.chest, None);
        assert_eq!(view.measurements.updated_at, 1_000);
    }

    #[test]
    fn test_create_is_idempotent_per_owner() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let first = store.create_profile(new_profile("owner-1"), 1_000).unwrap();
        let second = store.create_profile(new_profile("owner-1"), 2_000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let token = ShareToken::generate();

        assert!(store.pin_hash(&token).unwrap().is_none());
        assert!(store.public_profile(&token).unwrap().is_none());
        assert!(matches!(
            store.update_measurements(&token, &MeasurementUpdate::default(), 0),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn test_update_measurements() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let token = store.create_profile(new_profile("owner-1"), 1_000).unwrap();

        let update = MeasurementUpdate {
            chest: Some(98.5),
            ..Default::default()
        };
        let record = store.update_measurements(&token, &update, 5_000).unwrap();
        assert_eq!(record.chest, Some(98.5));

        let view = store.public_profile(&token).unwrap().unwrap();
        assert_eq!(view.measurements.chest, Some(98.5));
        assert_eq!(view.measurements.updated_at, 5_000);
    }

    #[test]
    fn test_delete_owner_cascades() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let token = store.create_profile(new_profile("owner-1"), 1_000).unwrap();

        assert_eq!(store.delete_owner("owner-1").unwrap(), Some(token.clone()));
        assert!(store.public_profile(&token).unwrap().is_none());
        assert!(store.find_token_by_owner("owner-1").unwrap().is_none());
        assert!(store.delete_owner("owner-1").unwrap().is_none());
    }
}
