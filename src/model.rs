//! Domain data model: `StarSystem`, `Body`, `BaryCentre`, `Ring`,
//! `Faction`, `Mission`, `RouteItem`, `SessionState`, and the small value
//! types they're built from.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type SystemAddress = u64;
pub type BodyId = i32;
pub type MissionId = u64;

/// Light-second in metres.
pub const LIGHT_SECOND_M: f64 = 299_792_458.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerraformState {
    #[default]
    None,
    Terraformable,
    Terraforming,
    Terraformed,
}

impl TerraformState {
    pub fn from_journal_str(s: &str) -> Self {
        match s {
            "Terraformable" => TerraformState::Terraformable,
            "Terraforming" => TerraformState::Terraforming,
            "Terraformed" => TerraformState::Terraformed,
            _ => TerraformState::None,
        }
    }

    pub fn is_terraformable(self) -> bool {
        !matches!(self, TerraformState::None)
    }

    pub fn as_sql_text(self) -> &'static str {
        match self {
            TerraformState::None => "none",
            TerraformState::Terraformable => "terraformable",
            TerraformState::Terraforming => "terraforming",
            TerraformState::Terraformed => "terraformed",
        }
    }
}

macro_rules! journal_enum {
    ($name:ident { $($variant:ident),* $(,)? }) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            Unknown,
            $($variant),*
        }

        impl $name {
            pub fn from_journal_str(s: &str) -> Self {
                let lower = s.to_ascii_lowercase();
                $(if lower == stringify!($variant).to_ascii_lowercase() {
                    return $name::$variant;
                })*
                $name::Unknown
            }

            pub fn as_sql_text(self) -> &'static str {
                match self {
                    $name::Unknown => "unknown",
                    $($name::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

journal_enum!(Government {
    Anarchy, Communism, Confederacy, Cooperative, Corporate, Democracy,
    Dictatorship, Feudal, Patronage, PrisonColony, Theocracy, Engineer,
    PrivateOwnership,
});

journal_enum!(Allegiance {
    Independent, Alliance, Empire, Federation, Thargoid, Guardian,
});

journal_enum!(Happiness {
    Elated, Happy, Discontented, Unhappy, Despondent,
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassBand {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AtmosphereElement {
    pub name: String,
    pub percent: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Signal {
    pub kind: String,
    pub count: u16,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Genus {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Composition {
    pub ice: f64,
    pub rock: f64,
    pub metal: f64,
}

/// A planetary ring. Keyed by `(system_address, parent_body_id, name)`; the
/// ring's own `body_id` is `-1` until a later surface scan backfills it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ring {
    /// The 6-character suffix of the full journal name (e.g. `"A Ring"`),
    /// not the full `"<system> <planet> A Ring"` string.
    pub name: String,
    pub ring_class: String,
    pub mass_mt: f64,
    pub inner_rad: f64,
    pub outer_rad: f64,
    pub parent_body_id: BodyId,
    pub body_id: BodyId,
    pub signals: Vec<Signal>,
}

impl Ring {
    pub fn new(
        name: String,
        ring_class: String,
        mass_mt: f64,
        inner_rad: f64,
        outer_rad: f64,
        parent_body_id: BodyId,
    ) -> Self {
        Ring {
            name,
            ring_class,
            mass_mt,
            inner_rad,
            outer_rad,
            parent_body_id,
            body_id: -1,
            signals: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StarDetails {
    pub star_type: String,
    pub luminosity: String,
    pub stellar_mass: f64,
    pub absolute_magnitude: f64,
    pub surface_temperature: f64,
    pub rotation_period: Option<f64>,
    pub age_my: u32,
    pub sub_class: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanetDetails {
    pub parent_planet: Option<BodyId>,
    pub parent_star: Option<BodyId>,
    pub parent_barycentre: Option<BodyId>,
    pub terraform_state: TerraformState,
    pub planet_class: String,
    pub atmosphere: String,
    pub atmosphere_type: String,
    pub atmosphere_composition: Vec<AtmosphereElement>,
    pub volcanism: String,
    pub composition: Composition,
    pub mass_em: f64,
    pub surface_gravity: f64,
    pub surface_temperature: f64,
    pub surface_pressure: f64,
    pub ascending_node: f64,
    pub mean_anomaly: f64,
    pub rotation_period: Option<f64>,
    pub axial_tilt: Option<f64>,
    pub landable: bool,
    pub tidal_lock: bool,
    pub was_mapped: bool,
    pub was_footfalled: bool,
    pub mapped: bool,
    pub footfalled: bool,
    pub signals: Vec<Signal>,
    pub genuses: Vec<Genus>,
}

impl PlanetDetails {
    /// Primary orbital parent: Planet preferred over Star over Barycentre,
    /// matching `discover_logic.cc`'s `parent_t::id()` order.
    pub fn primary_parent(&self) -> Option<BodyId> {
        self.parent_planet.or(self.parent_star).or(self.parent_barycentre)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BodyDetails {
    Star(StarDetails),
    Planet(PlanetDetails),
}

/// A scanned body, keyed by `(system_address, body_id)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Body {
    pub system_address: SystemAddress,
    pub body_id: BodyId,
    pub name: String,
    pub orbital_period: f64,
    pub orbital_inclination: f64,
    pub distance_from_arrival_ls: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub periapsis: f64,
    pub radius: f64,
    pub was_discovered: bool,
    pub value: u32,
    pub details: BodyDetails,
}

impl Body {
    pub fn is_planet(&self) -> bool {
        matches!(self.details, BodyDetails::Planet(_))
    }

    pub fn planet_details(&self) -> Option<&PlanetDetails> {
        match &self.details {
            BodyDetails::Planet(p) => Some(p),
            BodyDetails::Star(_) => None,
        }
    }

    pub fn planet_details_mut(&mut self) -> Option<&mut PlanetDetails> {
        match &mut self.details {
            BodyDetails::Planet(p) => Some(p),
            BodyDetails::Star(_) => None,
        }
    }

    pub fn class_band(&self) -> ClassBand {
        crate::valuation::class_band(self.value)
    }
}

/// Orbital elements of an unobserved centre of mass, keyed by
/// `(system_address, body_id)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaryCentre {
    pub system_address: SystemAddress,
    pub body_id: BodyId,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub orbital_inclination: f64,
    pub periapsis: f64,
    pub orbital_period: f64,
    pub ascending_node: f64,
    pub mean_anomaly: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StarSystem {
    pub system_address: SystemAddress,
    pub name: String,
    pub star_type: String,
    pub system_location: [f64; 3],
    pub sub_class: u8,
    pub fss_complete: bool,
    pub bary_centre: Vec<BaryCentre>,
    pub bodies: Vec<Body>,
    pub rings: Vec<Ring>,
}

impl StarSystem {
    pub fn new_minimal(system_address: SystemAddress, name: String, star_type: String) -> Self {
        StarSystem {
            system_address,
            name,
            star_type,
            system_location: [0.0, 0.0, 0.0],
            sub_class: 0,
            fss_complete: false,
            bary_centre: Vec::new(),
            bodies: Vec::new(),
            rings: Vec::new(),
        }
    }

    pub fn body_by_id(&self, body_id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.body_id == body_id)
    }

    pub fn body_by_id_mut(&mut self, body_id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.body_id == body_id)
    }

    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|b| b.name == name)
    }

    pub fn ring_by_body_id(&self, body_id: BodyId) -> Option<&Ring> {
        self.rings.iter().find(|r| r.body_id == body_id)
    }

    pub fn ring_by_body_id_mut(&mut self, body_id: BodyId) -> Option<&mut Ring> {
        self.rings.iter_mut().find(|r| r.body_id == body_id)
    }

    /// Locates a ring by its parent body and own suffix name (e.g. `"A Ring"`),
    /// used for the surface scan's ring body-id backfill.
    pub fn ring_by_name_and_parent_mut(&mut self, parent_body_id: BodyId, name: &str) -> Option<&mut Ring> {
        self.rings.iter_mut().find(|r| r.parent_body_id == parent_body_id && r.name == name)
    }

    /// `"<system> <suffix>"` with the journal's leading system-name prefix
    /// stripped, e.g. body_short_name in `discover_logic.cc`.
    pub fn short_name<'a>(&self, full_name: &'a str) -> &'a str {
        full_name.strip_prefix(&self.name).unwrap_or(full_name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    Accepted,
    Redirected,
    Completed,
    Failed,
    Abandoned,
}

impl MissionStatus {
    pub fn as_sql_text(self) -> &'static str {
        match self {
            MissionStatus::Accepted => "accepted",
            MissionStatus::Redirected => "redirected",
            MissionStatus::Completed => "completed",
            MissionStatus::Failed => "failed",
            MissionStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_sql_text(s: &str) -> Self {
        match s {
            "redirected" => MissionStatus::Redirected,
            "completed" => MissionStatus::Completed,
            "failed" => MissionStatus::Failed,
            "abandoned" => MissionStatus::Abandoned,
            _ => MissionStatus::Accepted,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mission {
    pub mission_id: MissionId,
    pub status: MissionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
    pub faction: String,
    pub mission_type: String,
    pub description: String,
    pub reward: u64,
    pub target: String,
    pub target_type: String,
    pub target_faction: String,
    pub destination_system: String,
    pub destination_station: String,
    pub destination_settlement: String,
    pub redirected_system: String,
    pub redirected_station: String,
    pub redirected_settlement: String,
    pub count: u32,
    pub kill_count: u16,
    pub passenger_count: u16,
}

impl Mission {
    pub fn mission_count(&self) -> u32 {
        self.count
            .max(self.kill_count as u32)
            .max(self.passenger_count as u32)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Faction {
    /// `-1` until stored; row id thereafter.
    pub oid: i64,
    pub name: String,
    pub influence: f64,
    pub reputation: f64,
    pub government: Government,
    pub allegiance: Allegiance,
    pub happiness: Happiness,
}

impl PartialEq for Faction {
    /// Ignores row identity (`oid`) for change-detection, matching
    /// `elite_data.cc::faction_info_t::operator==` exactly (it also does not
    /// compare `name`, since equality is only ever checked between two
    /// records already known to share the same name via `load_faction`).
    fn eq(&self, other: &Self) -> bool {
        self.government == other.government
            && self.allegiance == other.allegiance
            && self.happiness == other.happiness
            && self.influence == other.influence
            && self.reputation == other.reputation
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteItem {
    pub system_name: String,
    pub system_address: SystemAddress,
    pub star_pos: [f64; 3],
    pub star_class: String,
    pub distance_ly: f64,
    pub visited: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShipModule {
    pub slot: String,
    pub item: String,
    pub on: bool,
    pub priority: u8,
    pub health: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShipLoadout {
    pub ship: String,
    pub ship_id: u32,
    pub ship_name: String,
    pub ship_ident: String,
    pub hull_health: f32,
    pub cargo_capacity: u32,
    pub cargo_used: u32,
    pub fuel_capacity: f32,
    pub fuel_level: f32,
    pub modules: Vec<ShipModule>,
}

impl ShipLoadout {
    /// `Loadout` replaces the whole snapshot and sorts modules by priority
    /// ascending.
    pub fn sort_modules(&mut self) {
        self.modules.sort_by_key(|m| m.priority);
    }
}

/// Signals/genuses that arrived before their owning body was scanned.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BufferedSignals {
    pub body_id: BodyId,
    pub signals: Vec<Signal>,
    pub genuses: Vec<Genus>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub system: StarSystem,
    pub buffered_signals: Vec<BufferedSignals>,
    pub factions: Vec<Faction>,
    pub missions: Vec<Mission>,
    pub ship: ShipLoadout,
    pub next_target: Option<String>,
    pub route: Vec<RouteItem>,
}

impl SessionState {
    pub fn new(system: StarSystem) -> Self {
        SessionState {
            system,
            buffered_signals: Vec::new(),
            factions: Vec::new(),
            missions: Vec::new(),
            ship: ShipLoadout::default(),
            next_target: None,
            route: Vec::new(),
        }
    }
}

/// Trailing character of a procedural system name indicating approximate
/// mass class (`a`-`h`). A pure data derivation over the name, not presentation.
pub fn extract_mass_code(system_name: &str) -> Option<char> {
    let c = system_name.trim_end().chars().last()?;
    if c.is_ascii_alphabetic() && c.is_ascii_lowercase() {
        Some(c)
    } else {
        None
    }
}

/// For a ring named `"<system> <planet-suffix> <X> Ring"`, returns the
/// planet's full body name (the leading part before the trailing
/// `" X Ring"`, 7 characters).
pub fn planet_name_from_ring_name(ring_full_name: &str) -> &str {
    let len = ring_full_name.len();
    if len > 7 {
        &ring_full_name[..len - 7]
    } else {
        ring_full_name
    }
}

/// The ring's own stored name: the trailing 6 characters of the full
/// journal name (e.g. `"A Ring"`), matching `stralgo::right(ring.Name, 6)`
/// in `database_import_state.cc`.
pub fn ring_suffix(ring_full_name: &str) -> &str {
    let len = ring_full_name.len();
    if len > 6 {
        &ring_full_name[len - 6..]
    } else {
        ring_full_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_name_split_separates_planet_and_suffix() {
        let full = "Sys A 1 A Ring";
        assert_eq!(ring_suffix(full), "A Ring");
        assert_eq!(planet_name_from_ring_name(full), "Sys A 1");
    }

    #[test]
    fn faction_equality_ignores_oid() {
        let a = Faction {
            oid: -1,
            name: "Faction A".into(),
            influence: 0.2,
            reputation: 10.0,
            government: Government::Democracy,
            allegiance: Allegiance::Federation,
            happiness: Happiness::Happy,
        };
        let mut b = a.clone();
        b.oid = 42;
        assert_eq!(a, b);
        b.influence = 0.3;
        assert_ne!(a, b);
    }

    #[test]
    fn mass_code_extraction() {
        assert_eq!(extract_mass_code("Outotempes AA-B c15-3"), None);
        assert_eq!(extract_mass_code("Outotempes a"), Some('a'));
    }
}
