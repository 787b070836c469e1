//! Concrete per-tag event record shapes, mirroring the journal's JSON
//! fields for the recognised event tags.

use serde::Deserialize;
use time::OffsetDateTime;

fn default_localised(primary: Option<String>, localised: Option<String>) -> String {
    localised.or(primary).unwrap_or_default()
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenericEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub event: String,
    #[serde(rename = "ScanType")]
    pub scan_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FsdTargetEvent {
    pub name: String,
    #[serde(rename = "StarClass")]
    pub star_class: String,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "RemainingJumpsInRoute")]
    pub remaining_jumps_in_route: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StartJumpEvent {
    #[serde(rename = "JumpType")]
    pub jump_type: String,
    #[serde(rename = "StarSystem")]
    pub star_system: Option<String>,
    #[serde(rename = "SystemAddress")]
    pub system_address: Option<u64>,
    #[serde(rename = "StarClass")]
    pub star_class: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FactionInfoEvent {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Government")]
    pub government: String,
    #[serde(rename = "Allegiance")]
    pub allegiance: String,
    #[serde(rename = "Happiness_Localised", default)]
    pub happiness_localised: Option<String>,
    #[serde(rename = "Happiness", default)]
    pub happiness: Option<String>,
    #[serde(rename = "Influence")]
    pub influence: f64,
    #[serde(rename = "MyReputation")]
    pub my_reputation: f64,
}

impl FactionInfoEvent {
    pub fn happiness_text(&self) -> String {
        default_localised(self.happiness.clone(), self.happiness_localised.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FsdJumpEvent {
    #[serde(rename = "StarSystem")]
    pub star_system: String,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "StarPos")]
    pub star_pos: [f64; 3],
    #[serde(rename = "FuelUsed")]
    pub fuel_used: f64,
    #[serde(rename = "FuelLevel")]
    pub fuel_level: f64,
    #[serde(rename = "Factions", default)]
    pub factions: Vec<FactionInfoEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LocationEvent {
    #[serde(rename = "StarSystem")]
    pub star_system: String,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "StarPos")]
    pub star_pos: [f64; 3],
    #[serde(rename = "Factions", default)]
    pub factions: Vec<FactionInfoEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FssDiscoveryScanEvent {
    #[serde(rename = "BodyCount")]
    pub body_count: u32,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParentEvent {
    #[serde(rename = "Planet")]
    pub planet: Option<i32>,
    #[serde(rename = "Star")]
    pub star: Option<i32>,
    #[serde(rename = "Null")]
    pub null: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CompositionEvent {
    #[serde(rename = "Ice", default)]
    pub ice: f64,
    #[serde(rename = "Rock", default)]
    pub rock: f64,
    #[serde(rename = "Metal", default)]
    pub metal: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AtmosphereElementEvent {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Percent")]
    pub percent: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RingEvent {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "RingClass")]
    pub ring_class: String,
    #[serde(rename = "MassMT")]
    pub mass_mt: f64,
    #[serde(rename = "InnerRad")]
    pub inner_rad: f64,
    #[serde(rename = "OuterRad")]
    pub outer_rad: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScanEvent {
    #[serde(rename = "BodyName")]
    pub body_name: String,
    #[serde(rename = "BodyID")]
    pub body_id: i32,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "StarSystem")]
    pub star_system: String,
    #[serde(rename = "Rings", default)]
    pub rings: Vec<RingEvent>,
    #[serde(rename = "DistanceFromArrivalLS")]
    pub distance_from_arrival_ls: f64,
    #[serde(rename = "SemiMajorAxis", default)]
    pub semi_major_axis: f64,
    #[serde(rename = "Eccentricity", default)]
    pub eccentricity: f64,
    #[serde(rename = "OrbitalInclination", default)]
    pub orbital_inclination: f64,
    #[serde(rename = "Periapsis", default)]
    pub periapsis: f64,
    #[serde(rename = "OrbitalPeriod", default)]
    pub orbital_period: f64,
    #[serde(rename = "AscendingNode", default)]
    pub ascending_node: f64,
    #[serde(rename = "MeanAnomaly", default)]
    pub mean_anomaly: f64,
    #[serde(rename = "RotationPeriod")]
    pub rotation_period: Option<f64>,
    #[serde(rename = "AxialTilt")]
    pub axial_tilt: Option<f64>,
    #[serde(rename = "Radius", default)]
    pub radius: f64,
    #[serde(rename = "WasDiscovered", default)]
    pub was_discovered: bool,
    #[serde(rename = "WasMapped", default)]
    pub was_mapped: bool,

    // Star fields.
    #[serde(rename = "StarType")]
    pub star_type: Option<String>,
    #[serde(rename = "Luminosity", default)]
    pub luminosity: Option<String>,
    #[serde(rename = "StellarMass", default)]
    pub stellar_mass: Option<f64>,
    #[serde(rename = "AbsoluteMagnitude", default)]
    pub absolute_magnitude: Option<f64>,
    #[serde(rename = "SurfaceTemperature", default)]
    pub surface_temperature: Option<f64>,
    #[serde(rename = "Age_MY", default)]
    pub age_my: Option<u32>,
    #[serde(rename = "Subclass", default)]
    pub sub_class: Option<u8>,

    // Planet fields.
    #[serde(rename = "Parents", default)]
    pub parents: Vec<ParentEvent>,
    #[serde(rename = "TerraformState", default)]
    pub terraform_state: String,
    #[serde(rename = "PlanetClass")]
    pub planet_class: Option<String>,
    #[serde(rename = "Atmosphere", default)]
    pub atmosphere: String,
    #[serde(rename = "AtmosphereType", default)]
    pub atmosphere_type: String,
    #[serde(rename = "AtmosphereComposition", default)]
    pub atmosphere_composition: Vec<AtmosphereElementEvent>,
    #[serde(rename = "Volcanism", default)]
    pub volcanism: String,
    #[serde(rename = "Composition", default)]
    pub composition: CompositionEvent,
    #[serde(rename = "MassEM", default)]
    pub mass_em: Option<f64>,
    #[serde(rename = "SurfaceGravity", default)]
    pub surface_gravity: f64,
    #[serde(rename = "SurfacePressure", default)]
    pub surface_pressure: f64,
    #[serde(rename = "Landable", default)]
    pub landable: bool,
    #[serde(rename = "TidalLock", default)]
    pub tidal_lock: bool,
    #[serde(rename = "WasFootfalled", default)]
    pub was_footfalled: bool,
}

impl ScanEvent {
    pub fn is_star(&self) -> bool {
        self.star_type.is_some() && self.planet_class.is_none()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SaaScanCompleteEvent {
    #[serde(rename = "BodyName")]
    pub body_name: String,
    #[serde(rename = "BodyID")]
    pub body_id: i32,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScanBaryCentreEvent {
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "BodyID")]
    pub body_id: i32,
    #[serde(rename = "SemiMajorAxis")]
    pub semi_major_axis: f64,
    #[serde(rename = "Eccentricity")]
    pub eccentricity: f64,
    #[serde(rename = "OrbitalInclination")]
    pub orbital_inclination: f64,
    #[serde(rename = "Periapsis")]
    pub periapsis: f64,
    #[serde(rename = "OrbitalPeriod")]
    pub orbital_period: f64,
    #[serde(rename = "AscendingNode")]
    pub ascending_node: f64,
    #[serde(rename = "MeanAnomaly")]
    pub mean_anomaly: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SignalEvent {
    #[serde(rename = "Type_Localised", default)]
    pub type_localised: Option<String>,
    #[serde(rename = "Type", default)]
    pub r#type: Option<String>,
    #[serde(rename = "Count")]
    pub count: u16,
}

impl SignalEvent {
    pub fn kind(&self) -> String {
        default_localised(self.r#type.clone(), self.type_localised.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenusEvent {
    #[serde(rename = "Genus_Localised", default)]
    pub genus_localised: Option<String>,
    #[serde(rename = "Genus", default)]
    pub genus: Option<String>,
}

impl GenusEvent {
    pub fn name(&self) -> String {
        default_localised(self.genus.clone(), self.genus_localised.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FssBodySignalsEvent {
    #[serde(rename = "BodyName")]
    pub body_name: String,
    #[serde(rename = "BodyID")]
    pub body_id: i32,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "Signals", default)]
    pub signals: Vec<SignalEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SaaSignalsFoundEvent {
    #[serde(rename = "BodyName")]
    pub body_name: String,
    #[serde(rename = "BodyID")]
    pub body_id: i32,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "Signals", default)]
    pub signals: Vec<SignalEvent>,
    #[serde(rename = "Genuses", default)]
    pub genuses: Vec<GenusEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FssAllBodiesFoundEvent {
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FuelScoopEvent {
    #[serde(rename = "Scooped")]
    pub scooped: f32,
    #[serde(rename = "Total")]
    pub total: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ModuleEvent {
    #[serde(rename = "Slot")]
    pub slot: String,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "On")]
    pub on: bool,
    #[serde(rename = "Priority")]
    pub priority: u8,
    #[serde(rename = "Health")]
    pub health: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FuelCapacityEvent {
    #[serde(rename = "Main")]
    pub main: f32,
    #[serde(rename = "Reserve")]
    pub reserve: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoadoutEvent {
    #[serde(rename = "Ship")]
    pub ship: String,
    #[serde(rename = "ShipID")]
    pub ship_id: u32,
    #[serde(rename = "ShipName")]
    pub ship_name: String,
    #[serde(rename = "ShipIdent")]
    pub ship_ident: String,
    #[serde(rename = "HullHealth")]
    pub hull_health: f32,
    #[serde(rename = "CargoCapacity")]
    pub cargo_capacity: u32,
    #[serde(rename = "FuelCapacity")]
    pub fuel_capacity: FuelCapacityEvent,
    #[serde(rename = "Modules", default)]
    pub modules: Vec<ModuleEvent>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CargoEvent {
    #[serde(rename = "Count", default)]
    pub count: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MissionAcceptedEvent {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
    #[serde(rename = "Faction")]
    pub faction: String,
    #[serde(rename = "Name")]
    pub mission_type: String,
    #[serde(rename = "LocalisedName", default)]
    pub description: Option<String>,
    #[serde(rename = "Reward", default)]
    pub reward: u64,
    #[serde(rename = "TargetType_Localised", default)]
    pub target_type: Option<String>,
    #[serde(rename = "Target", default)]
    pub target: Option<String>,
    #[serde(rename = "TargetFaction", default)]
    pub target_faction: Option<String>,
    #[serde(rename = "DestinationSystem", default)]
    pub destination_system: Option<String>,
    #[serde(rename = "DestinationStation", default)]
    pub destination_station: Option<String>,
    #[serde(rename = "DestinationSettlement", default)]
    pub destination_settlement: Option<String>,
    #[serde(rename = "KillCount", default)]
    pub kill_count: Option<u16>,
    #[serde(rename = "PassengerCount", default)]
    pub passenger_count: Option<u16>,
    #[serde(rename = "Count", default)]
    pub count: Option<u32>,
    #[serde(rename = "Expiry", with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MissionStatusChangeEvent {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MissionRedirectedEvent {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
    #[serde(rename = "NewDestinationSystem", default)]
    pub new_destination_system: Option<String>,
    #[serde(rename = "NewDestinationStation", default)]
    pub new_destination_station: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MissionsListItem {
    #[serde(rename = "MissionID")]
    pub mission_id: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MissionsEvent {
    #[serde(rename = "Failed", default)]
    pub failed: Vec<MissionsListItem>,
    #[serde(rename = "Complete", default)]
    pub complete: Vec<MissionsListItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NavRouteItemEvent {
    #[serde(rename = "StarSystem")]
    pub star_system: String,
    #[serde(rename = "SystemAddress")]
    pub system_address: u64,
    #[serde(rename = "StarPos")]
    pub star_pos: [f64; 3],
    #[serde(rename = "StarClass")]
    pub star_class: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NavRouteEvent {
    #[serde(rename = "Route", default)]
    pub route: Vec<NavRouteItemEvent>,
}
