//! Applies each parsed event to `SessionState`, buffering orphaned signals,
//! persisting deltas, and reporting which notification kinds fired.

use time::OffsetDateTime;

use crate::error::StateError;
use crate::journal::events::*;
use crate::journal::EventKind;
use crate::missions;
use crate::model::{
    self, BaryCentre, Body, BodyDetails, BodyId, BufferedSignals, Composition, Faction, Genus,
    MissionStatus, PlanetDetails, Ring, Signal, StarDetails, StarSystem, SystemAddress,
    TerraformState,
};
use crate::route;
use crate::storage::Storage;
use crate::valuation;

/// A notification kind emitted by a handled event; multiple may fire for
/// one event and are coalesced by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    SystemChanged,
    ShipChanged,
    RouteChanged,
    MissionsChanged,
}

impl StateErrorExt for StateError {
    /// Fatal storage failures must abort the ingestion loop; other
    /// variants are logic violations to log and skip.
    fn is_fatal(&self) -> bool {
        matches!(self, StateError::Storage(_))
    }
}

/// Extension trait kept local so `is_fatal` lives alongside the dispatch
/// logic that relies on it rather than in the bare error definitions.
pub trait StateErrorExt {
    fn is_fatal(&self) -> bool;
}

/// A single `handle(timestamp, event)` method shared by every concrete
/// handler (live session, backfill importer, or a future discover-only
/// variant).
pub trait SessionHandler {
    fn handle(&mut self, timestamp: OffsetDateTime, event: EventKind) -> Result<Vec<Notification>, StateError>;
}

/// Borrows a `SessionState` and `Storage` for the duration of one `handle`
/// call. Both the backfill pass and the live tailer construct one of these
/// per event, so the transition table below is exercised identically by
/// both import paths.
pub struct Importer<'a> {
    pub state: &'a mut model::SessionState,
    pub storage: &'a Storage,
}

impl<'a> SessionHandler for Importer<'a> {
    fn handle(&mut self, _timestamp: OffsetDateTime, event: EventKind) -> Result<Vec<Notification>, StateError> {
        use Notification::*;

        match event {
            EventKind::StartJump(ev) => {
                if ev.jump_type != "Hyperspace" {
                    return Ok(vec![]);
                }
                let Some(address) = ev.system_address else { return Ok(vec![]) };
                let name = ev.star_system.unwrap_or_default();
                let star_class = ev.star_class.unwrap_or_default();
                adopt_or_create_system(self.state, self.storage, address, name, star_class)?;
                self.state.factions.clear();
                route::mark_visited_through(&mut self.state.route, address);
                Ok(vec![SystemChanged, RouteChanged])
            }

            EventKind::Location(ev) => {
                adopt_or_create_system(self.state, self.storage, ev.system_address, ev.star_system, String::new())?;
                if self.state.system.system_location != ev.star_pos {
                    self.state.system.system_location = ev.star_pos;
                    self.storage.store_system_location(ev.system_address, ev.star_pos)?;
                }
                self.state.buffered_signals.clear();
                upsert_factions(self.state, self.storage, &ev.factions)?;
                route::mark_visited_through(&mut self.state.route, ev.system_address);
                Ok(vec![SystemChanged, RouteChanged])
            }

            EventKind::FsdJump(ev) => {
                if ev.system_address != self.state.system.system_address {
                    return Err(StateError::SystemAddressMismatch {
                        current: self.state.system.system_address,
                        event: ev.system_address,
                    });
                }
                if self.state.system.system_location != ev.star_pos {
                    self.state.system.system_location = ev.star_pos;
                    self.storage.store_system_location(ev.system_address, ev.star_pos)?;
                }
                self.state.ship.fuel_level = ev.fuel_level as f32;
                upsert_factions(self.state, self.storage, &ev.factions)?;
                route::mark_visited_through(&mut self.state.route, ev.system_address);
                Ok(vec![SystemChanged, ShipChanged, RouteChanged])
            }

            EventKind::FsdTarget(ev) => {
                self.state.next_target = Some(ev.name);
                Ok(vec![SystemChanged])
            }

            EventKind::FssDiscoveryScan(ev) => {
                if ev.system_address == self.state.system.system_address {
                    self.state.system.bodies.reserve(ev.body_count as usize);
                }
                Ok(vec![])
            }

            EventKind::Scan(ev) => handle_scan(self.state, self.storage, ev),

            EventKind::ScanBaryCentre(ev) => {
                let bc = BaryCentre {
                    system_address: ev.system_address,
                    body_id: ev.body_id,
                    semi_major_axis: ev.semi_major_axis,
                    eccentricity: ev.eccentricity,
                    orbital_inclination: ev.orbital_inclination,
                    periapsis: ev.periapsis,
                    orbital_period: ev.orbital_period,
                    ascending_node: ev.ascending_node,
                    mean_anomaly: ev.mean_anomaly,
                };
                self.storage.store_bary_centre(ev.system_address, &bc)?;
                self.state.system.bary_centre.push(bc);
                Ok(vec![SystemChanged])
            }

            EventKind::FssBodySignals(ev) => {
                let signals: Vec<Signal> = ev.signals.iter().map(|s| Signal { kind: s.kind(), count: s.count }).collect();
                attach_or_buffer_signals(self.state, self.storage, ev.body_id, signals, Vec::new(), false)
            }

            EventKind::SaaSignalsFound(ev) => {
                let signals: Vec<Signal> = ev.signals.iter().map(|s| Signal { kind: s.kind(), count: s.count }).collect();
                let genuses: Vec<Genus> = ev.genuses.iter().map(|g| Genus { name: g.name() }).collect();

                if ev.body_name.ends_with("Ring") {
                    if let Some(ring_oid) = self.storage.ring_oid_by_body_id(ev.system_address, ev.body_id)? {
                        self.storage.replace_ring_signals(ring_oid, &signals)?;
                        if let Some(ring) = self.state.system.ring_by_body_id_mut(ev.body_id) {
                            ring.signals = signals;
                        }
                        Ok(vec![SystemChanged])
                    } else {
                        tracing::error!(body_id = ev.body_id, "DSS signals for unregistered ring");
                        Ok(vec![])
                    }
                } else {
                    attach_or_buffer_signals(self.state, self.storage, ev.body_id, signals, genuses, true)
                }
            }

            EventKind::FssAllBodiesFound(ev) => {
                if ev.system_address == self.state.system.system_address {
                    self.state.system.fss_complete = true;
                    self.storage.store_fss_complete(ev.system_address)?;
                }
                Ok(vec![SystemChanged])
            }

            EventKind::SaaScanComplete(ev) => handle_dss_complete(self.state, self.storage, ev),

            EventKind::Loadout(ev) => {
                self.state.ship.ship = ev.ship;
                self.state.ship.ship_id = ev.ship_id;
                self.state.ship.ship_name = ev.ship_name;
                self.state.ship.ship_ident = ev.ship_ident;
                self.state.ship.hull_health = ev.hull_health;
                self.state.ship.cargo_capacity = ev.cargo_capacity;
                self.state.ship.fuel_capacity = ev.fuel_capacity.main;
                self.state.ship.modules = ev
                    .modules
                    .into_iter()
                    .map(|m| model::ShipModule { slot: m.slot, item: m.item, on: m.on, priority: m.priority, health: m.health })
                    .collect();
                self.state.ship.sort_modules();
                Ok(vec![ShipChanged])
            }

            EventKind::FuelScoop(ev) => {
                self.state.ship.fuel_level = ev.total;
                Ok(vec![ShipChanged])
            }

            EventKind::Cargo(ev) => {
                self.state.ship.cargo_used = ev.count;
                Ok(vec![ShipChanged])
            }

            EventKind::MissionAccepted(ev) => {
                let mission = model::Mission {
                    mission_id: ev.mission_id,
                    status: MissionStatus::Accepted,
                    expiry: ev.expiry,
                    faction: ev.faction,
                    mission_type: ev.mission_type,
                    description: ev.description.unwrap_or_default(),
                    reward: ev.reward,
                    target: ev.target.unwrap_or_default(),
                    target_type: ev.target_type.unwrap_or_default(),
                    target_faction: ev.target_faction.unwrap_or_default(),
                    destination_system: ev.destination_system.unwrap_or_default(),
                    destination_station: ev.destination_station.unwrap_or_default(),
                    destination_settlement: ev.destination_settlement.unwrap_or_default(),
                    redirected_system: String::new(),
                    redirected_station: String::new(),
                    redirected_settlement: String::new(),
                    count: ev.count.unwrap_or(0),
                    kill_count: ev.kill_count.unwrap_or(0),
                    passenger_count: ev.passenger_count.unwrap_or(0),
                };
                self.state.missions = missions::accept(self.storage, &mission)?;
                Ok(vec![MissionsChanged])
            }

            EventKind::MissionCompleted(ev) => {
                self.state.missions = missions::set_status(self.storage, ev.mission_id, MissionStatus::Completed)?;
                Ok(vec![MissionsChanged])
            }

            EventKind::MissionFailed(ev) => {
                self.state.missions = missions::set_status(self.storage, ev.mission_id, MissionStatus::Failed)?;
                Ok(vec![MissionsChanged])
            }

            EventKind::MissionAbandoned(ev) => {
                self.state.missions = missions::set_status(self.storage, ev.mission_id, MissionStatus::Abandoned)?;
                Ok(vec![MissionsChanged])
            }

            EventKind::MissionRedirected(ev) => {
                self.state.missions = missions::redirect(
                    self.storage,
                    ev.mission_id,
                    ev.new_destination_system.as_deref().unwrap_or_default(),
                    ev.new_destination_station.as_deref().unwrap_or_default(),
                    "",
                )?;
                Ok(vec![MissionsChanged])
            }

            EventKind::Missions(ev) => {
                for item in &ev.failed {
                    self.storage.change_mission_status(item.mission_id, MissionStatus::Failed)?;
                }
                for item in &ev.complete {
                    self.storage.change_mission_status(item.mission_id, MissionStatus::Completed)?;
                }
                self.state.missions = self.storage.load_missions()?;
                Ok(vec![MissionsChanged])
            }

            EventKind::NavRoute(ev) => {
                self.state.route = route::build_route(&ev);
                route::mark_visited_through(&mut self.state.route, self.state.system.system_address);
                Ok(vec![RouteChanged])
            }

            EventKind::NavRouteClear => {
                self.state.route.clear();
                Ok(vec![RouteChanged])
            }

            EventKind::Unrecognised(_) => Ok(vec![]),
        }
    }
}

/// `StartJump`/`Location`: load the target system from storage if present,
/// else construct and store a minimal record. Shared because both events
/// move the session onto a (possibly new) system the same way.
fn adopt_or_create_system(
    state: &mut model::SessionState,
    storage: &Storage,
    address: SystemAddress,
    name: String,
    star_class: String,
) -> Result<(), StateError> {
    if state.system.system_address == address {
        return Ok(());
    }

    if let Some(loaded) = storage.load_system(address)? {
        state.system = loaded;
    } else {
        let system = StarSystem::new_minimal(address, name, star_class);
        storage.store_system_minimal(&system)?;
        state.system = system;
    }
    Ok(())
}

fn upsert_factions(state: &mut model::SessionState, storage: &Storage, factions: &[FactionInfoEvent]) -> Result<(), StateError> {
    let mut applicable = Vec::with_capacity(factions.len());
    for info in factions {
        let mut faction = storage.load_faction(&info.name)?.unwrap_or(Faction {
            oid: -1,
            name: info.name.clone(),
            influence: 0.0,
            reputation: 0.0,
            government: model::Government::Unknown,
            allegiance: model::Allegiance::Unknown,
            happiness: model::Happiness::Unknown,
        });

        let updated = Faction {
            oid: faction.oid,
            name: info.name.clone(),
            influence: info.influence,
            reputation: info.my_reputation,
            government: model::Government::from_journal_str(&info.government),
            allegiance: model::Allegiance::from_journal_str(&info.allegiance),
            happiness: model::Happiness::from_journal_str(&info.happiness_text()),
        };

        if updated != faction || faction.oid == -1 {
            storage.update_faction_info(&updated)?;
            if let Some(oid) = storage.load_faction(&info.name)?.map(|f| f.oid) {
                faction = updated;
                faction.oid = oid;
            }
        } else {
            faction = updated;
        }
        applicable.push(faction);
    }
    state.factions = applicable;
    Ok(())
}

fn handle_scan(state: &mut model::SessionState, storage: &Storage, ev: ScanEvent) -> Result<Vec<Notification>, StateError> {
    use Notification::*;

    if ev.system_address != state.system.system_address {
        return Ok(vec![]);
    }
    if state.system.fss_complete {
        // A scan arriving after the full-system scan completed is stale; drop it.
        return Ok(vec![]);
    }
    if state.system.body_by_id(ev.body_id).is_some() {
        // At most one insert per body_id.
        return Ok(vec![]);
    }

    let is_star = ev.is_star();
    let mass_em = ev.mass_em.unwrap_or(0.0);
    let terraform_state = TerraformState::from_journal_str(&ev.terraform_state);

    let details = if is_star {
        BodyDetails::Star(StarDetails {
            star_type: ev.star_type.clone().unwrap_or_default(),
            luminosity: ev.luminosity.clone().unwrap_or_default(),
            stellar_mass: ev.stellar_mass.unwrap_or(0.0),
            absolute_magnitude: ev.absolute_magnitude.unwrap_or(0.0),
            surface_temperature: ev.surface_temperature.unwrap_or(0.0),
            rotation_period: ev.rotation_period,
            age_my: ev.age_my.unwrap_or(0),
            sub_class: ev.sub_class.unwrap_or(0),
        })
    } else {
        let (parent_planet, parent_star, parent_barycentre) = extract_parents(&ev.parents);
        BodyDetails::Planet(PlanetDetails {
            parent_planet,
            parent_star,
            parent_barycentre,
            terraform_state,
            planet_class: ev.planet_class.clone().unwrap_or_default(),
            atmosphere: ev.atmosphere.clone(),
            atmosphere_type: ev.atmosphere_type.clone(),
            atmosphere_composition: ev
                .atmosphere_composition
                .iter()
                .map(|e| model::AtmosphereElement { name: e.name.clone(), percent: e.percent })
                .collect(),
            volcanism: ev.volcanism.clone(),
            composition: Composition { ice: ev.composition.ice, rock: ev.composition.rock, metal: ev.composition.metal },
            mass_em,
            surface_gravity: ev.surface_gravity,
            surface_temperature: ev.surface_temperature.unwrap_or(0.0),
            surface_pressure: ev.surface_pressure,
            ascending_node: ev.ascending_node,
            mean_anomaly: ev.mean_anomaly,
            rotation_period: ev.rotation_period,
            axial_tilt: ev.axial_tilt,
            landable: ev.landable,
            tidal_lock: ev.tidal_lock,
            was_mapped: ev.was_mapped,
            was_footfalled: ev.was_footfalled,
            mapped: false,
            footfalled: false,
            signals: Vec::new(),
            genuses: Vec::new(),
        })
    };

    let mut body = Body {
        system_address: ev.system_address,
        body_id: ev.body_id,
        name: ev.body_name.clone(),
        orbital_period: ev.orbital_period,
        orbital_inclination: ev.orbital_inclination,
        distance_from_arrival_ls: ev.distance_from_arrival_ls,
        semi_major_axis: ev.semi_major_axis,
        eccentricity: ev.eccentricity,
        periapsis: ev.periapsis,
        radius: ev.radius,
        was_discovered: ev.was_discovered,
        value: 0,
        details,
    };

    // Adopt any buffered signals/genuses for this body id, then forget them.
    if let Some(idx) = state.buffered_signals.iter().position(|b| b.body_id == ev.body_id) {
        let buffered = state.buffered_signals.remove(idx);
        if let Some(planet) = body.planet_details_mut() {
            planet.signals = buffered.signals;
            planet.genuses = buffered.genuses;
        }
    }

    body.value = compute_value(&body, mass_em, ev.was_discovered, ev.was_mapped);

    // Persist after the buffer merge so storage and memory agree immediately:
    // the fully-merged body goes to storage in a single write.
    storage.store_body(ev.system_address, &body)?;
    state.system.bodies.push(body);

    for ring_ev in &ev.rings {
        let ring = Ring::new(
            model::ring_suffix(&ring_ev.name).to_string(),
            ring_ev.ring_class.clone(),
            ring_ev.mass_mt,
            ring_ev.inner_rad,
            ring_ev.outer_rad,
            ev.body_id,
        );
        storage.store_ring(ev.system_address, &ring)?;
        state.system.rings.push(ring);
    }

    Ok(vec![SystemChanged])
}

/// Parent selection prefers `Planet` over `Star` over barycentre (`Null`),
/// taking the first occurrence of each in the journal's `Parents` list order.
fn extract_parents(parents: &[ParentEvent]) -> (Option<BodyId>, Option<BodyId>, Option<BodyId>) {
    let mut planet = None;
    let mut star = None;
    let mut bary = None;
    for p in parents {
        if planet.is_none() {
            if let Some(id) = p.planet {
                planet = Some(id);
            }
        }
        if star.is_none() {
            if let Some(id) = p.star {
                star = Some(id);
            }
        }
        if bary.is_none() {
            if let Some(id) = p.null {
                bary = Some(id);
            }
        }
    }
    (planet, star, bary)
}

fn compute_value(body: &Body, mass_em: f64, was_discovered: bool, was_mapped: bool) -> u32 {
    match &body.details {
        BodyDetails::Star(star) => valuation::star_value(&star.star_type, star.stellar_mass),
        BodyDetails::Planet(planet) => valuation::calculate_value(
            &planet.planet_class,
            mass_em,
            planet.terraform_state.is_terraformable(),
            !was_discovered,
            !was_mapped,
            true,
        ),
    }
}

/// `FSSBodySignals`/`SAASignalsFound` (non-ring case): attach to the body if
/// present, else enqueue into `buffered_signals` keyed by body id.
fn attach_or_buffer_signals(
    state: &mut model::SessionState,
    storage: &Storage,
    body_id: BodyId,
    signals: Vec<Signal>,
    genuses: Vec<Genus>,
    is_dss: bool,
) -> Result<Vec<Notification>, StateError> {
    if state.system.body_by_id(body_id).is_some() {
        let system_address = state.system.system_address;
        let Some(body_oid) = storage.oid_for_body(system_address, body_id)? else {
            return Ok(vec![]);
        };

        if let Some(body) = state.system.body_by_id_mut(body_id) {
            if let Some(planet) = body.planet_details_mut() {
                if is_dss || planet.signals.len() != signals.len() {
                    planet.signals = signals.clone();
                    storage.replace_body_signals(body_oid, &planet.signals)?;
                }
                if is_dss && !genuses.is_empty() {
                    planet.genuses = genuses.clone();
                    storage.replace_body_genuses(body_oid, &planet.genuses)?;
                }
            }
        }
        Ok(vec![Notification::SystemChanged])
    } else {
        match state.buffered_signals.iter_mut().find(|b| b.body_id == body_id) {
            Some(entry) => {
                entry.signals = signals;
                if !genuses.is_empty() {
                    entry.genuses = genuses;
                }
            }
            None => state.buffered_signals.push(BufferedSignals { body_id, signals, genuses }),
        }
        Ok(vec![])
    }
}

fn handle_dss_complete(
    state: &mut model::SessionState,
    storage: &Storage,
    ev: SaaScanCompleteEvent,
) -> Result<Vec<Notification>, StateError> {
    use Notification::*;

    if ev.body_name.ends_with("Ring") {
        let planet_name = model::planet_name_from_ring_name(&ev.body_name);
        let ring_suffix = model::ring_suffix(&ev.body_name);

        let Some(parent) = state.system.body_by_name(planet_name) else {
            tracing::error!(body = %ev.body_name, "ring DSS complete for unknown parent body");
            return Ok(vec![]);
        };
        let parent_body_id = parent.body_id;

        if state.system.ring_by_name_and_parent_mut(parent_body_id, ring_suffix).is_none() {
            return Err(StateError::RingParentNotFound(parent_body_id));
        }

        storage.store_ring_body_id(ev.system_address, parent_body_id, ring_suffix, ev.body_id)?;
        if let Some(ring) = state.system.ring_by_name_and_parent_mut(parent_body_id, ring_suffix) {
            ring.body_id = ev.body_id;
        }
        Ok(vec![SystemChanged])
    } else {
        storage.store_dss_complete(ev.system_address, ev.body_id)?;
        if let Some(body) = state.system.body_by_id_mut(ev.body_id) {
            if let Some(planet) = body.planet_details_mut() {
                planet.mapped = true;
            }
        }
        Ok(vec![SystemChanged])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SessionState, StarSystem};
    use crate::storage::Storage;

    fn fresh() -> (SessionState, Storage) {
        (SessionState::new(StarSystem::new_minimal(0, String::new(), String::new())), Storage::open_in_memory().unwrap())
    }

    #[test]
    fn scenario_1_fresh_system_flow() {
        let (mut state, storage) = fresh();
        let mut importer = Importer { state: &mut state, storage: &storage };

        let start_jump = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"StartJump","JumpType":"Hyperspace","StarSystem":"S","SystemAddress":42,"StarClass":"K"}"#;
        let scan = r#"{"timestamp":"2024-01-01T00:01:00Z","event":"Scan","BodyName":"S 1","BodyID":1,"SystemAddress":42,"StarSystem":"S","DistanceFromArrivalLS":0.0,"PlanetClass":"Earthlike body","MassEM":1.0,"WasDiscovered":false,"WasMapped":false}"#;
        let fss_done = r#"{"timestamp":"2024-01-01T00:02:00Z","event":"FSSAllBodiesFound","SystemAddress":42,"Count":1}"#;

        for line in [start_jump, scan, fss_done] {
            let parsed = crate::journal::parse_line(line).unwrap();
            importer.handle(parsed.timestamp, parsed.kind).unwrap();
        }

        assert!(state.system.fss_complete);
        let body = state.system.body_by_id(1).unwrap();
        let fss = 181_126.0_f64 * 1.0_f64.powf(0.2).max(0.3);
        let dss = fss * (10.0 / 3.0) * 1.25;
        let expected = ((fss + dss) * 3.695244).round() as u32;
        assert_eq!(body.value, expected);

        let stored = storage.load_system(42).unwrap().unwrap();
        assert!(stored.fss_complete);
        assert_eq!(stored.bodies.len(), 1);
    }

    #[test]
    fn scenario_2_buffered_signal_attaches_on_scan() {
        let (mut state, storage) = fresh();
        storage.store_system_minimal(&state.system).unwrap();
        let mut importer = Importer { state: &mut state, storage: &storage };

        let signals = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSSBodySignals","BodyName":"S 7","BodyID":7,"SystemAddress":0,"Signals":[{"Type":"$SAA_SignalType_Biological;","Count":2}]}"#;
        let scan = r#"{"timestamp":"2024-01-01T00:01:00Z","event":"Scan","BodyName":"S 7","BodyID":7,"SystemAddress":0,"StarSystem":"S","DistanceFromArrivalLS":0.0,"PlanetClass":"High metal content body","TerraformState":"Terraformable","MassEM":0.07,"WasDiscovered":false,"WasMapped":false}"#;

        for line in [signals, scan] {
            let parsed = crate::journal::parse_line(line).unwrap();
            importer.handle(parsed.timestamp, parsed.kind).unwrap();
        }

        assert!(state.buffered_signals.is_empty());
        let body = state.system.body_by_id(7).unwrap();
        assert_eq!(body.planet_details().unwrap().signals.len(), 1);
        assert!(body.value > 1_100_000, "value too low: {}", body.value);
    }

    #[test]
    fn scenario_3_late_scan_dropped_after_fss_complete() {
        let (mut state, storage) = fresh();
        storage.store_system_minimal(&state.system).unwrap();
        let mut importer = Importer { state: &mut state, storage: &storage };

        let fss_done = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSSAllBodiesFound","SystemAddress":0,"Count":1}"#;
        let late_scan = r#"{"timestamp":"2024-01-01T00:01:00Z","event":"Scan","BodyName":"S 9","BodyID":9,"SystemAddress":0,"StarSystem":"S","DistanceFromArrivalLS":0.0,"PlanetClass":"Icy body","MassEM":0.1,"WasDiscovered":false,"WasMapped":false}"#;

        for line in [fss_done, late_scan] {
            let parsed = crate::journal::parse_line(line).unwrap();
            importer.handle(parsed.timestamp, parsed.kind).unwrap();
        }

        assert!(state.system.body_by_id(9).is_none());
    }

    #[test]
    fn scenario_4_ring_dss_backfill() {
        let (mut state, storage) = fresh();
        storage.store_system_minimal(&state.system).unwrap();
        let mut importer = Importer { state: &mut state, storage: &storage };

        let scan = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"Scan","BodyName":"Sys A 1","BodyID":1,"SystemAddress":0,"StarSystem":"Sys A","DistanceFromArrivalLS":0.0,"PlanetClass":"Icy body","MassEM":0.1,"WasDiscovered":false,"WasMapped":false,"Rings":[{"Name":"Sys A 1 A Ring","RingClass":"eRingClass_Icy","MassMT":1.0,"InnerRad":1.0,"OuterRad":2.0}]}"#;
        let dss_complete = r#"{"timestamp":"2024-01-01T00:01:00Z","event":"SAAScanComplete","BodyName":"Sys A 1 A Ring","BodyID":77,"SystemAddress":0}"#;

        for line in [scan, dss_complete] {
            let parsed = crate::journal::parse_line(line).unwrap();
            importer.handle(parsed.timestamp, parsed.kind).unwrap();
        }

        let ring = state.system.ring_by_body_id(77).unwrap();
        assert_eq!(ring.name, "A Ring");
        let stored = storage.load_system(0).unwrap().unwrap();
        assert_eq!(stored.rings[0].body_id, 77);
    }

    #[test]
    fn scenario_5_mission_lifecycle() {
        let (mut state, storage) = fresh();
        let mut importer = Importer { state: &mut state, storage: &storage };

        let accepted = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"MissionAccepted","MissionID":1,"Faction":"F","Name":"Mission_Courier","Reward":1000,"Expiry":"2099-01-01T00:00:00Z"}"#;
        let redirected = r#"{"timestamp":"2024-01-01T00:01:00Z","event":"MissionRedirected","MissionID":1,"NewDestinationSystem":"X"}"#;

        for line in [accepted, redirected] {
            let parsed = crate::journal::parse_line(line).unwrap();
            importer.handle(parsed.timestamp, parsed.kind).unwrap();
        }

        let loaded = storage.load_missions().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].status, MissionStatus::Redirected);
        assert_eq!(loaded[0].redirected_system, "X");
    }

    #[test]
    fn i4_location_clears_buffered_signals() {
        let (mut state, storage) = fresh();
        storage.store_system_minimal(&state.system).unwrap();
        state.buffered_signals.push(BufferedSignals { body_id: 1, signals: vec![], genuses: vec![] });
        let mut importer = Importer { state: &mut state, storage: &storage };

        let location = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"Location","StarSystem":"S","SystemAddress":99,"StarPos":[1.0,2.0,3.0]}"#;
        let parsed = crate::journal::parse_line(location).unwrap();
        importer.handle(parsed.timestamp, parsed.kind).unwrap();

        assert!(state.buffered_signals.is_empty());
    }

    #[test]
    fn fsd_jump_address_mismatch_is_logic_violation() {
        let (mut state, storage) = fresh();
        state.system.system_address = 1;
        let mut importer = Importer { state: &mut state, storage: &storage };

        let jump = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSDJump","StarSystem":"S","SystemAddress":2,"StarPos":[0.0,0.0,0.0],"FuelUsed":1.0,"FuelLevel":10.0}"#;
        let parsed = crate::journal::parse_line(jump).unwrap();
        let err = importer.handle(parsed.timestamp, parsed.kind).unwrap_err();
        assert!(matches!(err, StateError::SystemAddressMismatch { .. }));
        assert!(!err.is_fatal());
    }
}
