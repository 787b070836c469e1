//! Mission status transitions over the persistent store plus the
//! "massacre"-type aggregation view.

use crate::error::StorageError;
use crate::model::{Mission, MissionId, MissionStatus};
use crate::storage::Storage;

/// `MissionAccepted`: idempotent insert by `mission_id`, then reload.
pub fn accept(storage: &Storage, mission: &Mission) -> Result<Vec<Mission>, StorageError> {
    if !storage.mission_exists(mission.mission_id)? {
        storage.store_mission(mission)?;
    }
    storage.load_missions()
}

/// `MissionCompleted`/`Failed`/`Abandoned`: update status, then reload.
pub fn set_status(storage: &Storage, mission_id: MissionId, status: MissionStatus) -> Result<Vec<Mission>, StorageError> {
    storage.change_mission_status(mission_id, status)?;
    storage.load_missions()
}

/// `MissionRedirected`: update status to redirected plus destination, then reload.
pub fn redirect(
    storage: &Storage,
    mission_id: MissionId,
    system: &str,
    station: &str,
    settlement: &str,
) -> Result<Vec<Mission>, StorageError> {
    storage.redirect_mission(mission_id, system, station, settlement)?;
    storage.load_missions()
}

/// Aggregation view for "massacre"-type missions grouped by
/// `(destination_system, faction)`, counting `kills_pending` (status
/// `accepted`) and `kills_done` (status `redirected`).
#[derive(Clone, Debug, PartialEq)]
pub struct MassacreGroup {
    pub destination_system: String,
    pub faction: String,
    pub kills_pending: u32,
    pub kills_done: u32,
}

pub fn massacre_aggregation(missions: &[Mission]) -> Vec<MassacreGroup> {
    let mut groups: Vec<MassacreGroup> = Vec::new();

    for mission in missions {
        if !mission.mission_type.to_ascii_lowercase().contains("massacre") {
            continue;
        }

        let kills = mission.mission_count();
        let group = groups
            .iter_mut()
            .find(|g| g.destination_system == mission.destination_system && g.faction == mission.faction);

        let group = match group {
            Some(g) => g,
            None => {
                groups.push(MassacreGroup {
                    destination_system: mission.destination_system.clone(),
                    faction: mission.faction.clone(),
                    kills_pending: 0,
                    kills_done: 0,
                });
                groups.last_mut().unwrap()
            }
        };

        match mission.status {
            MissionStatus::Accepted => group.kills_pending += kills,
            MissionStatus::Redirected => group.kills_done += kills,
            _ => {}
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn mission(status: MissionStatus, dest: &str, faction: &str, kills: u16) -> Mission {
        Mission {
            mission_id: 1,
            status,
            expiry: OffsetDateTime::UNIX_EPOCH,
            faction: faction.to_string(),
            mission_type: "Mission_Massacre".to_string(),
            description: String::new(),
            reward: 0,
            target: String::new(),
            target_type: String::new(),
            target_faction: String::new(),
            destination_system: dest.to_string(),
            destination_station: String::new(),
            destination_settlement: String::new(),
            redirected_system: String::new(),
            redirected_station: String::new(),
            redirected_settlement: String::new(),
            count: 0,
            kill_count: kills,
            passenger_count: 0,
        }
    }

    #[test]
    fn massacre_groups_by_destination_and_faction() {
        let missions = vec![
            mission(MissionStatus::Accepted, "Sys A", "Faction X", 5),
            mission(MissionStatus::Accepted, "Sys A", "Faction X", 3),
            mission(MissionStatus::Redirected, "Sys A", "Faction X", 4),
            mission(MissionStatus::Accepted, "Sys B", "Faction Y", 10),
        ];
        let groups = massacre_aggregation(&missions);
        assert_eq!(groups.len(), 2);
        let a = groups.iter().find(|g| g.destination_system == "Sys A").unwrap();
        assert_eq!(a.kills_pending, 8);
        assert_eq!(a.kills_done, 4);
    }

    #[test]
    fn non_massacre_missions_excluded() {
        let mut m = mission(MissionStatus::Accepted, "Sys A", "Faction X", 5);
        m.mission_type = "Mission_Courier".to_string();
        assert!(massacre_aggregation(&[m]).is_empty());
    }
}
