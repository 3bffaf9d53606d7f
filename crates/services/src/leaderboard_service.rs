use std::collections::HashMap;
use std::sync::Arc;

use arena_core::model::{SchoolId, UserId};
use serde::Serialize;
use storage::repository::{BattleRecordRepository, SchoolRepository, UserRepository};

use crate::error::LeaderboardError;

/// One row of the student ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentStanding {
    pub rank: u32,
    pub uid: UserId,
    pub full_name: String,
    pub school_name: String,
    pub total_score: u64,
    pub battles: u32,
}

/// One row of the school ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolStanding {
    pub rank: u32,
    pub school_id: SchoolId,
    pub name: String,
    pub total_score: u64,
    pub students: u32,
}

#[derive(Default)]
struct Tally {
    total: u64,
    battles: u32,
}

/// Rankings computed from stored battle results.
#[derive(Clone)]
pub struct LeaderboardService {
    users: Arc<dyn UserRepository>,
    schools: Arc<dyn SchoolRepository>,
    records: Arc<dyn BattleRecordRepository>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        schools: Arc<dyn SchoolRepository>,
        records: Arc<dyn BattleRecordRepository>,
    ) -> Self {
        Self {
            users,
            schools,
            records,
        }
    }

    /// Students ordered by the sum of their final scores; ties by name.
    ///
    /// Anonymous results and results of deleted profiles are not ranked.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if repository access fails.
    pub async fn students(&self, limit: usize) -> Result<Vec<StudentStanding>, LeaderboardError> {
        let mut rows = self.all_students().await?;
        rows.truncate(limit);
        Ok(rows)
    }

    /// Schools ordered by the summed scores of their students; ties by name.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if repository access fails.
    pub async fn schools(&self, limit: usize) -> Result<Vec<SchoolStanding>, LeaderboardError> {
        let profiles = self.users.list_profiles().await?;
        let tallies = self.tallies().await?;

        let mut totals: HashMap<SchoolId, (u64, u32)> = HashMap::new();
        for profile in &profiles {
            let Some(school_id) = profile.school_id() else {
                continue;
            };
            let entry = totals.entry(school_id).or_default();
            entry.0 += tallies.get(&profile.uid()).map_or(0, |t| t.total);
            entry.1 += 1;
        }

        let mut rows: Vec<SchoolStanding> = self
            .schools
            .list_schools()
            .await?
            .into_iter()
            .map(|school| {
                let (total_score, students) = totals.get(&school.id()).copied().unwrap_or_default();
                SchoolStanding {
                    rank: 0,
                    school_id: school.id(),
                    name: school.name().to_owned(),
                    total_score,
                    students,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.name.cmp(&b.name))
        });
        for (rank, row) in (1_u32..).zip(rows.iter_mut()) {
            row.rank = rank;
        }
        rows.truncate(limit);
        Ok(rows)
    }

    async fn all_students(&self) -> Result<Vec<StudentStanding>, LeaderboardError> {
        let tallies = self.tallies().await?;
        let mut rows: Vec<StudentStanding> = self
            .users
            .list_profiles()
            .await?
            .into_iter()
            .filter_map(|profile| {
                let tally = tallies.get(&profile.uid())?;
                Some(StudentStanding {
                    rank: 0,
                    uid: profile.uid(),
                    full_name: profile.full_name().to_owned(),
                    school_name: profile.school_name().to_owned(),
                    total_score: tally.total,
                    battles: tally.battles,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.full_name.cmp(&b.full_name))
        });
        for (rank, row) in (1_u32..).zip(rows.iter_mut()) {
            row.rank = rank;
        }
        Ok(rows)
    }

    async fn tallies(&self) -> Result<HashMap<UserId, Tally>, LeaderboardError> {
        let mut tallies: HashMap<UserId, Tally> = HashMap::new();
        for row in self.records.list_records(None, u32::MAX).await? {
            let Some(player) = row.record.player() else {
                continue;
            };
            let tally = tallies.entry(player).or_default();
            tally.total += u64::from(row.record.final_score());
            tally.battles += 1;
        }
        Ok(tallies)
    }
}
