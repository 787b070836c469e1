//! SQL schema for the embedded store: table names, creation DDL, and the
//! `%Y-%m-%dT%H:%M:%SZ` timestamp encoding shared by every table that
//! carries a timestamp column.

use rusqlite::Connection;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::StorageError;

pub const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).expect("well-formed timestamp format description")
}

pub mod tables {
    pub const STAR_SYSTEM: &str = "star_system";
    pub const BARY_CENTRE: &str = "bary_centre";
    pub const BODY: &str = "body";
    pub const RING: &str = "ring";
    pub const PLANET_DETAILS: &str = "planet_details";
    pub const STAR_DETAILS: &str = "star_details";
    pub const SIGNAL: &str = "signal";
    pub const GENUS: &str = "genus";
    pub const ATMOSPHERE_ELEMENT: &str = "atmosphere_element";
    pub const FACTION_INFO: &str = "faction_info";
    pub const MISSION: &str = "mission";
}

/// Creates every table if absent, matching `create_database`'s table list
/// and primary-key choice exactly (`system_address` for systems,
/// `mission_id` for missions, `oid` row id for the rest).
pub fn create_tables(conn: &Connection) -> Result<(), StorageError> {
    const DDL: &str =
        "
        CREATE TABLE IF NOT EXISTS star_system (
            system_address INTEGER PRIMARY KEY,
            name TEXT,
            star_type TEXT,
            location_x REAL,
            location_y REAL,
            location_z REAL,
            sub_class INTEGER,
            fss_complete INTEGER
        );

        CREATE TABLE IF NOT EXISTS bary_centre (
            oid INTEGER PRIMARY KEY,
            ref_system_address INTEGER,
            body_id INTEGER,
            semi_major_axis REAL,
            eccentricity REAL,
            orbital_inclination REAL,
            periapsis REAL,
            orbital_period REAL,
            ascending_node REAL,
            mean_anomaly REAL
        );

        CREATE TABLE IF NOT EXISTS body (
            oid INTEGER PRIMARY KEY,
            ref_system_address INTEGER,
            body_id INTEGER,
            name TEXT,
            body_type TEXT,
            orbital_period REAL,
            orbital_inclination REAL,
            distance_from_arrival_ls REAL,
            semi_major_axis REAL,
            eccentricity REAL,
            periapsis REAL,
            radius REAL,
            was_discovered INTEGER,
            value INTEGER
        );

        CREATE TABLE IF NOT EXISTS ring (
            oid INTEGER PRIMARY KEY,
            ref_system_address INTEGER,
            parent_body_id INTEGER,
            name TEXT,
            ring_class TEXT,
            mass_mt REAL,
            inner_rad REAL,
            outer_rad REAL,
            body_id INTEGER
        );

        CREATE TABLE IF NOT EXISTS planet_details (
            oid INTEGER PRIMARY KEY,
            ref_body_oid INTEGER,
            parent_planet INTEGER,
            parent_star INTEGER,
            parent_barycentre INTEGER,
            terraform_state TEXT,
            planet_class TEXT,
            atmosphere TEXT,
            atmosphere_type TEXT,
            volcanism TEXT,
            ice REAL,
            rock REAL,
            metal REAL,
            mass_em REAL,
            surface_gravity REAL,
            surface_temperature REAL,
            surface_pressure REAL,
            ascending_node REAL,
            mean_anomaly REAL,
            rotation_period REAL,
            axial_tilt REAL,
            landable INTEGER,
            tidal_lock INTEGER,
            was_mapped INTEGER,
            was_footfalled INTEGER,
            mapped INTEGER,
            footfalled INTEGER
        );

        CREATE TABLE IF NOT EXISTS star_details (
            oid INTEGER PRIMARY KEY,
            ref_body_oid INTEGER,
            star_type TEXT,
            luminosity TEXT,
            stellar_mass REAL,
            absolute_magnitude REAL,
            surface_temperature REAL,
            rotation_period REAL,
            age_my INTEGER,
            sub_class INTEGER
        );

        CREATE TABLE IF NOT EXISTS signal (
            oid INTEGER PRIMARY KEY,
            ref_body_oid INTEGER,
            ref_ring_oid INTEGER,
            kind TEXT,
            count INTEGER
        );

        CREATE TABLE IF NOT EXISTS genus (
            oid INTEGER PRIMARY KEY,
            ref_body_oid INTEGER,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS atmosphere_element (
            oid INTEGER PRIMARY KEY,
            ref_body_oid INTEGER,
            name TEXT,
            percent REAL
        );

        CREATE TABLE IF NOT EXISTS faction_info (
            oid INTEGER PRIMARY KEY,
            name TEXT,
            government TEXT,
            allegiance TEXT,
            happiness TEXT,
            influence REAL,
            reputation REAL
        );

        CREATE TABLE IF NOT EXISTS mission (
            mission_id INTEGER PRIMARY KEY,
            status TEXT,
            expiry TEXT,
            faction TEXT,
            mission_type TEXT,
            description TEXT,
            reward INTEGER,
            target TEXT,
            target_type TEXT,
            target_faction TEXT,
            destination_system TEXT,
            destination_station TEXT,
            destination_settlement TEXT,
            redirected_system TEXT,
            redirected_station TEXT,
            redirected_settlement TEXT,
            count INTEGER,
            kill_count INTEGER,
            passenger_count INTEGER
        );
        ";
    conn.execute_batch(DDL).map_err(|e| StorageError::bad_message(DDL, e))?;
    Ok(())
}
