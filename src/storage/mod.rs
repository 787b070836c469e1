//! Embedded single-file SQL store: create/insert/update/select over every
//! domain entity, with cascading inserts and referential hydration.

pub mod schema;

use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::model::{
    AtmosphereElement, BaryCentre, Body, BodyDetails, BodyId, Composition, Faction, Genus,
    Government, Allegiance, Happiness, Mission, MissionId, MissionStatus, PlanetDetails, Ring,
    Signal, StarDetails, StarSystem, SystemAddress, TerraformState,
};

use schema::format_timestamp;

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        schema::create_tables(&conn)?;
        Ok(Storage { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        schema::create_tables(&conn)?;
        Ok(Storage { conn })
    }

    // --- star_system ---------------------------------------------------

    pub fn store_system_minimal(&self, system: &StarSystem) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT OR IGNORE INTO star_system
                (system_address, name, star_type, location_x, location_y, location_z, sub_class, fss_complete)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
        self.conn
            .execute(
                QUERY,
                params![
                    system.system_address as i64,
                    system.name,
                    system.star_type,
                    system.system_location[0],
                    system.system_location[1],
                    system.system_location[2],
                    system.sub_class,
                    system.fss_complete as i64,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn store_fss_complete(&self, system_address: SystemAddress) -> Result<(), StorageError> {
        const QUERY: &str = "UPDATE star_system SET fss_complete=1 WHERE system_address=?1";
        self.conn
            .execute(QUERY, params![system_address as i64])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn store_system_location(&self, system_address: SystemAddress, loc: [f64; 3]) -> Result<(), StorageError> {
        const QUERY: &str =
            "UPDATE star_system SET location_x=?1, location_y=?2, location_z=?3 WHERE system_address=?4";
        self.conn
            .execute(QUERY, params![loc[0], loc[1], loc[2], system_address as i64])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn load_system(&self, system_address: SystemAddress) -> Result<Option<StarSystem>, StorageError> {
        const QUERY: &str = "SELECT name, star_type, location_x, location_y, location_z, sub_class, fss_complete
                 FROM star_system WHERE system_address=?1";
        let system_row = self
            .conn
            .query_row(
                QUERY,
                params![system_address as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, u8>(5)?,
                        row.get::<_, i64>(6)? != 0,
                    ))
                },
            )
            .optional()
            .map_err(|e| StorageError::bad_message(QUERY, e))?;

        let Some((name, star_type, x, y, z, sub_class, fss_complete)) = system_row else {
            return Ok(None);
        };

        let mut system = StarSystem::new_minimal(system_address, name, star_type);
        system.system_location = [x, y, z];
        system.sub_class = sub_class;
        system.fss_complete = fss_complete;

        system.bary_centre = self.load_bary_centres(system_address)?;
        system.bodies = self.load_bodies(system_address)?;
        system.rings = self.load_rings(system_address)?;

        Ok(Some(system))
    }

    // --- bary_centre -----------------------------------------------------

    pub fn store_bary_centre(&self, system_address: SystemAddress, bc: &BaryCentre) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO bary_centre
                (ref_system_address, body_id, semi_major_axis, eccentricity, orbital_inclination,
                 periapsis, orbital_period, ascending_node, mean_anomaly)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
        self.conn
            .execute(
                QUERY,
                params![
                    system_address as i64,
                    bc.body_id,
                    bc.semi_major_axis,
                    bc.eccentricity,
                    bc.orbital_inclination,
                    bc.periapsis,
                    bc.orbital_period,
                    bc.ascending_node,
                    bc.mean_anomaly,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    fn load_bary_centres(&self, system_address: SystemAddress) -> Result<Vec<BaryCentre>, StorageError> {
        const QUERY: &str = "SELECT body_id, semi_major_axis, eccentricity, orbital_inclination,
                    periapsis, orbital_period, ascending_node, mean_anomaly
             FROM bary_centre WHERE ref_system_address=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![system_address as i64], |row| {
                Ok(BaryCentre {
                    system_address,
                    body_id: row.get(0)?,
                    semi_major_axis: row.get(1)?,
                    eccentricity: row.get(2)?,
                    orbital_inclination: row.get(3)?,
                    periapsis: row.get(4)?,
                    orbital_period: row.get(5)?,
                    ascending_node: row.get(6)?,
                    mean_anomaly: row.get(7)?,
                })
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StorageError::bad_message(QUERY, e))
    }

    // --- body / planet_details / star_details / signal / genus / atmosphere ----

    /// Cascading insert: `body` row, then its `star_details`/`planet_details`
    /// row, then signals/genuses/atmosphere, all keyed off the body's own
    /// `last_insert_rowid()`.
    pub fn store_body(&self, system_address: SystemAddress, body: &Body) -> Result<i64, StorageError> {
        const QUERY: &str = "INSERT INTO body
                (ref_system_address, body_id, name, body_type, orbital_period, orbital_inclination,
                 distance_from_arrival_ls, semi_major_axis, eccentricity, periapsis, radius,
                 was_discovered, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";
        let body_type = if body.is_planet() { "planet" } else { "star" };
        self.conn
            .execute(
                QUERY,
                params![
                    system_address as i64,
                    body.body_id,
                    body.name,
                    body_type,
                    body.orbital_period,
                    body.orbital_inclination,
                    body.distance_from_arrival_ls,
                    body.semi_major_axis,
                    body.eccentricity,
                    body.periapsis,
                    body.radius,
                    body.was_discovered as i64,
                    body.value,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        let body_oid = self.conn.last_insert_rowid();

        match &body.details {
            BodyDetails::Star(star) => self.store_star_details(body_oid, star)?,
            BodyDetails::Planet(planet) => {
                self.store_planet_details(body_oid, planet)?;
                for signal in &planet.signals {
                    self.store_signal(Some(body_oid), None, signal)?;
                }
                for genus in &planet.genuses {
                    self.store_genus(body_oid, genus)?;
                }
                for element in &planet.atmosphere_composition {
                    self.store_atmosphere_element(body_oid, element)?;
                }
            }
        }

        Ok(body_oid)
    }

    fn store_star_details(&self, body_oid: i64, star: &StarDetails) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO star_details
                (ref_body_oid, star_type, luminosity, stellar_mass, absolute_magnitude,
                 surface_temperature, rotation_period, age_my, sub_class)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
        self.conn
            .execute(
                QUERY,
                params![
                    body_oid,
                    star.star_type,
                    star.luminosity,
                    star.stellar_mass,
                    star.absolute_magnitude,
                    star.surface_temperature,
                    star.rotation_period,
                    star.age_my,
                    star.sub_class,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    fn store_planet_details(&self, body_oid: i64, planet: &PlanetDetails) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO planet_details
                (ref_body_oid, parent_planet, parent_star, parent_barycentre, terraform_state,
                 planet_class, atmosphere, atmosphere_type, volcanism, ice, rock, metal, mass_em,
                 surface_gravity, surface_temperature, surface_pressure, ascending_node, mean_anomaly,
                 rotation_period, axial_tilt, landable, tidal_lock, was_mapped, was_footfalled,
                 mapped, footfalled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                     ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)";
        self.conn
            .execute(
                QUERY,
                params![
                    body_oid,
                    planet.parent_planet,
                    planet.parent_star,
                    planet.parent_barycentre,
                    planet.terraform_state.as_sql_text(),
                    planet.planet_class,
                    planet.atmosphere,
                    planet.atmosphere_type,
                    planet.volcanism,
                    planet.composition.ice,
                    planet.composition.rock,
                    planet.composition.metal,
                    planet.mass_em,
                    planet.surface_gravity,
                    planet.surface_temperature,
                    planet.surface_pressure,
                    planet.ascending_node,
                    planet.mean_anomaly,
                    planet.rotation_period,
                    planet.axial_tilt,
                    planet.landable as i64,
                    planet.tidal_lock as i64,
                    planet.was_mapped as i64,
                    planet.was_footfalled as i64,
                    planet.mapped as i64,
                    planet.footfalled as i64,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    fn store_signal(&self, body_oid: Option<i64>, ring_oid: Option<i64>, signal: &Signal) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO signal (ref_body_oid, ref_ring_oid, kind, count) VALUES (?1, ?2, ?3, ?4)";
        self.conn
            .execute(QUERY, params![body_oid, ring_oid, signal.kind, signal.count])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    fn store_genus(&self, body_oid: i64, genus: &Genus) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO genus (ref_body_oid, name) VALUES (?1, ?2)";
        self.conn
            .execute(QUERY, params![body_oid, genus.name])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    fn store_atmosphere_element(&self, body_oid: i64, element: &AtmosphereElement) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO atmosphere_element (ref_body_oid, name, percent) VALUES (?1, ?2, ?3)";
        self.conn
            .execute(QUERY, params![body_oid, element.name, element.percent])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn oid_for_body(&self, system_address: SystemAddress, body_id: BodyId) -> Result<Option<i64>, StorageError> {
        const QUERY: &str = "SELECT oid FROM body WHERE ref_system_address=?1 AND body_id=?2";
        self.conn
            .query_row(QUERY, params![system_address as i64, body_id], |row| row.get(0))
            .optional()
            .map_err(|e| StorageError::bad_message(QUERY, e))
    }

    /// Attaches signals to an already-stored body, replacing any existing
    /// rows for it (DSS signals "replace if count differs", modelled here
    /// as a full replace for simplicity).
    pub fn replace_body_signals(&self, body_oid: i64, signals: &[Signal]) -> Result<(), StorageError> {
        const QUERY: &str = "DELETE FROM signal WHERE ref_body_oid=?1";
        self.conn
            .execute(QUERY, params![body_oid])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        for signal in signals {
            self.store_signal(Some(body_oid), None, signal)?;
        }
        Ok(())
    }

    pub fn replace_body_genuses(&self, body_oid: i64, genuses: &[Genus]) -> Result<(), StorageError> {
        const QUERY: &str = "DELETE FROM genus WHERE ref_body_oid=?1";
        self.conn
            .execute(QUERY, params![body_oid])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        for genus in genuses {
            self.store_genus(body_oid, genus)?;
        }
        Ok(())
    }

    pub fn store_dss_complete(&self, system_address: SystemAddress, body_id: BodyId) -> Result<(), StorageError> {
        const QUERY: &str = "UPDATE planet_details SET mapped=1 WHERE ref_body_oid=?1";
        let Some(body_oid) = self.oid_for_body(system_address, body_id)? else {
            return Ok(());
        };
        self.conn
            .execute(QUERY, params![body_oid])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    fn load_bodies(&self, system_address: SystemAddress) -> Result<Vec<Body>, StorageError> {
        const QUERY: &str = "SELECT oid, body_id, name, body_type, orbital_period, orbital_inclination,
                    distance_from_arrival_ls, semi_major_axis, eccentricity, periapsis, radius,
                    was_discovered, value
             FROM body WHERE ref_system_address=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![system_address as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, BodyId>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                    row.get::<_, f64>(8)?,
                    row.get::<_, f64>(9)?,
                    row.get::<_, f64>(10)?,
                    row.get::<_, i64>(11)? != 0,
                    row.get::<_, u32>(12)?,
                ))
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;

        let mut bodies = Vec::new();
        for row in rows {
            let (oid, body_id, name, body_type, orbital_period, orbital_inclination, distance_from_arrival_ls,
                semi_major_axis, eccentricity, periapsis, radius, was_discovered, value) =
                row.map_err(|e| StorageError::bad_message(QUERY, e))?;

            let details = if body_type == "planet" {
                BodyDetails::Planet(self.load_planet_details(oid)?)
            } else {
                BodyDetails::Star(self.load_star_details(oid)?)
            };

            bodies.push(Body {
                system_address,
                body_id,
                name,
                orbital_period,
                orbital_inclination,
                distance_from_arrival_ls,
                semi_major_axis,
                eccentricity,
                periapsis,
                radius,
                was_discovered,
                value,
                details,
            });
        }
        Ok(bodies)
    }

    fn load_star_details(&self, body_oid: i64) -> Result<StarDetails, StorageError> {
        const QUERY: &str = "SELECT star_type, luminosity, stellar_mass, absolute_magnitude, surface_temperature,
                    rotation_period, age_my, sub_class
             FROM star_details WHERE ref_body_oid=?1";
        self.conn
            .query_row(QUERY, params![body_oid], |row| {
                Ok(StarDetails {
                    star_type: row.get(0)?,
                    luminosity: row.get(1)?,
                    stellar_mass: row.get(2)?,
                    absolute_magnitude: row.get(3)?,
                    surface_temperature: row.get(4)?,
                    rotation_period: row.get(5)?,
                    age_my: row.get(6)?,
                    sub_class: row.get(7)?,
                })
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))
    }

    fn load_planet_details(&self, body_oid: i64) -> Result<PlanetDetails, StorageError> {
        const QUERY: &str = "SELECT parent_planet, parent_star, parent_barycentre, terraform_state, planet_class,
                    atmosphere, atmosphere_type, volcanism, ice, rock, metal, mass_em, surface_gravity,
                    surface_temperature, surface_pressure, ascending_node, mean_anomaly, rotation_period,
                    axial_tilt, landable, tidal_lock, was_mapped, was_footfalled, mapped, footfalled
             FROM planet_details WHERE ref_body_oid=?1";
        let (parent_planet, parent_star, parent_barycentre, terraform_state, planet_class, atmosphere,
            atmosphere_type, volcanism, ice, rock, metal, mass_em, surface_gravity, surface_temperature,
            surface_pressure, ascending_node, mean_anomaly, rotation_period, axial_tilt, landable,
            tidal_lock, was_mapped, was_footfalled, mapped, footfalled) = self
            .conn
            .query_row(QUERY, params![body_oid], |row| {
                Ok((
                    row.get::<_, Option<BodyId>>(0)?,
                    row.get::<_, Option<BodyId>>(1)?,
                    row.get::<_, Option<BodyId>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, f64>(8)?,
                    row.get::<_, f64>(9)?,
                    row.get::<_, f64>(10)?,
                    row.get::<_, f64>(11)?,
                    row.get::<_, f64>(12)?,
                    row.get::<_, f64>(13)?,
                    row.get::<_, f64>(14)?,
                    row.get::<_, f64>(15)?,
                    row.get::<_, f64>(16)?,
                    row.get::<_, Option<f64>>(17)?,
                    row.get::<_, Option<f64>>(18)?,
                    row.get::<_, i64>(19)? != 0,
                    row.get::<_, i64>(20)? != 0,
                    row.get::<_, i64>(21)? != 0,
                    row.get::<_, i64>(22)? != 0,
                    row.get::<_, i64>(23)? != 0,
                    row.get::<_, i64>(24)? != 0,
                ))
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;

        let signals = self.load_signals_for_body(body_oid)?;
        let genuses = self.load_genuses(body_oid)?;
        let atmosphere_composition = self.load_atmosphere_elements(body_oid)?;

        Ok(PlanetDetails {
            parent_planet,
            parent_star,
            parent_barycentre,
            terraform_state: TerraformState::from_journal_str(&terraform_state),
            planet_class,
            atmosphere,
            atmosphere_type,
            atmosphere_composition,
            volcanism,
            composition: Composition { ice, rock, metal },
            mass_em,
            surface_gravity,
            surface_temperature,
            surface_pressure,
            ascending_node,
            mean_anomaly,
            rotation_period,
            axial_tilt,
            landable,
            tidal_lock,
            was_mapped,
            was_footfalled,
            mapped,
            footfalled,
            signals,
            genuses,
        })
    }

    fn load_signals_for_body(&self, body_oid: i64) -> Result<Vec<Signal>, StorageError> {
        const QUERY: &str = "SELECT kind, count FROM signal WHERE ref_body_oid=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![body_oid], |row| Ok(Signal { kind: row.get(0)?, count: row.get(1)? }))
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StorageError::bad_message(QUERY, e))
    }

    fn load_signals_for_ring(&self, ring_oid: i64) -> Result<Vec<Signal>, StorageError> {
        const QUERY: &str = "SELECT kind, count FROM signal WHERE ref_ring_oid=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![ring_oid], |row| Ok(Signal { kind: row.get(0)?, count: row.get(1)? }))
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StorageError::bad_message(QUERY, e))
    }

    fn load_genuses(&self, body_oid: i64) -> Result<Vec<Genus>, StorageError> {
        const QUERY: &str = "SELECT name FROM genus WHERE ref_body_oid=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![body_oid], |row| Ok(Genus { name: row.get(0)? }))
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StorageError::bad_message(QUERY, e))
    }

    fn load_atmosphere_elements(&self, body_oid: i64) -> Result<Vec<AtmosphereElement>, StorageError> {
        const QUERY: &str = "SELECT name, percent FROM atmosphere_element WHERE ref_body_oid=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![body_oid], |row| {
                Ok(AtmosphereElement { name: row.get(0)?, percent: row.get(1)? })
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StorageError::bad_message(QUERY, e))
    }

    // --- ring --------------------------------------------------------------

    pub fn store_ring(&self, system_address: SystemAddress, ring: &Ring) -> Result<i64, StorageError> {
        const QUERY: &str = "INSERT INTO ring
                (ref_system_address, parent_body_id, name, ring_class, mass_mt, inner_rad, outer_rad, body_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
        self.conn
            .execute(
                QUERY,
                params![
                    system_address as i64,
                    ring.parent_body_id,
                    ring.name,
                    ring.ring_class,
                    ring.mass_mt,
                    ring.inner_rad,
                    ring.outer_rad,
                    ring.body_id,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// `UPDATE ring SET body_id=... WHERE ref_system_address=... AND
    /// parent_body_id=... AND name=...` — the ring's own DSS backfill.
    pub fn store_ring_body_id(
        &self,
        system_address: SystemAddress,
        parent_body_id: BodyId,
        ring_name: &str,
        ring_body_id: BodyId,
    ) -> Result<(), StorageError> {
        const QUERY: &str =
            "UPDATE ring SET body_id=?1 WHERE ref_system_address=?2 AND parent_body_id=?3 AND name=?4";
        self.conn
            .execute(QUERY, params![ring_body_id, system_address as i64, parent_body_id, ring_name])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn ring_oid_by_body_id(&self, system_address: SystemAddress, body_id: BodyId) -> Result<Option<i64>, StorageError> {
        const QUERY: &str = "SELECT oid FROM ring WHERE ref_system_address=?1 AND body_id=?2";
        self.conn
            .query_row(QUERY, params![system_address as i64, body_id], |row| row.get(0))
            .optional()
            .map_err(|e| StorageError::bad_message(QUERY, e))
    }

    pub fn ring_oid(&self, system_address: SystemAddress, parent_body_id: BodyId, ring_name: &str) -> Result<Option<i64>, StorageError> {
        const QUERY: &str = "SELECT oid FROM ring WHERE ref_system_address=?1 AND parent_body_id=?2 AND name=?3";
        self.conn
            .query_row(QUERY, params![system_address as i64, parent_body_id, ring_name], |row| row.get(0))
            .optional()
            .map_err(|e| StorageError::bad_message(QUERY, e))
    }

    pub fn replace_ring_signals(&self, ring_oid: i64, signals: &[Signal]) -> Result<(), StorageError> {
        const QUERY: &str = "DELETE FROM signal WHERE ref_ring_oid=?1";
        self.conn
            .execute(QUERY, params![ring_oid])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        for signal in signals {
            self.store_signal(None, Some(ring_oid), signal)?;
        }
        Ok(())
    }

    fn load_rings(&self, system_address: SystemAddress) -> Result<Vec<Ring>, StorageError> {
        const QUERY: &str = "SELECT oid, parent_body_id, name, ring_class, mass_mt, inner_rad, outer_rad, body_id
             FROM ring WHERE ref_system_address=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![system_address as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, BodyId>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, BodyId>(7)?,
                ))
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;

        let mut rings = Vec::new();
        for row in rows {
            let (oid, parent_body_id, name, ring_class, mass_mt, inner_rad, outer_rad, body_id) =
                row.map_err(|e| StorageError::bad_message(QUERY, e))?;
            let signals = self.load_signals_for_ring(oid)?;
            rings.push(Ring { name, ring_class, mass_mt, inner_rad, outer_rad, parent_body_id, body_id, signals });
        }
        Ok(rings)
    }

    // --- faction -------------------------------------------------------

    pub fn load_faction(&self, name: &str) -> Result<Option<Faction>, StorageError> {
        const QUERY: &str = "SELECT oid, government, allegiance, happiness, influence, reputation
             FROM faction_info WHERE name=?1";
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let mut rows = stmt
            .query_map(params![name], |row| {
                Ok(Faction {
                    oid: row.get(0)?,
                    name: name.to_string(),
                    government: Government::from_journal_str(&row.get::<_, String>(1)?),
                    allegiance: Allegiance::from_journal_str(&row.get::<_, String>(2)?),
                    happiness: Happiness::from_journal_str(&row.get::<_, String>(3)?),
                    influence: row.get(4)?,
                    reputation: row.get(5)?,
                })
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;

        let first = rows.next().transpose().map_err(|e| StorageError::bad_message(QUERY, e))?;
        if rows.next().is_some() {
            tracing::error!(faction = name, "multiple faction records for one name");
        }
        Ok(first)
    }

    /// Upsert by value equality (ignoring row id): update if a record with
    /// this name already exists and differs, insert otherwise.
    pub fn update_faction_info(&self, faction: &Faction) -> Result<(), StorageError> {
        if faction.oid != -1 {
            const QUERY: &str = "UPDATE faction_info SET government=?1, allegiance=?2, happiness=?3, influence=?4,
                                          reputation=?5
                 WHERE oid=?6";
            self.conn
                .execute(
                    QUERY,
                    params![
                        faction.government.as_sql_text(),
                        faction.allegiance.as_sql_text(),
                        faction.happiness.as_sql_text(),
                        faction.influence,
                        faction.reputation,
                        faction.oid,
                    ],
                )
                .map_err(|e| StorageError::bad_message(QUERY, e))?;
        } else {
            const QUERY: &str = "INSERT INTO faction_info (name, government, allegiance, happiness, influence, reputation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
            self.conn
                .execute(
                    QUERY,
                    params![
                        faction.name,
                        faction.government.as_sql_text(),
                        faction.allegiance.as_sql_text(),
                        faction.happiness.as_sql_text(),
                        faction.influence,
                        faction.reputation,
                    ],
                )
                .map_err(|e| StorageError::bad_message(QUERY, e))?;
        }
        Ok(())
    }

    // --- mission ---------------------------------------------------------

    pub fn mission_exists(&self, mission_id: MissionId) -> Result<bool, StorageError> {
        const QUERY: &str = "SELECT count(*) FROM mission WHERE mission_id=?1";
        let count: i64 = self
            .conn
            .query_row(QUERY, params![mission_id as i64], |row| row.get(0))
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(count != 0)
    }

    pub fn store_mission(&self, mission: &Mission) -> Result<(), StorageError> {
        const QUERY: &str = "INSERT INTO mission
                (mission_id, status, expiry, faction, mission_type, description, reward, target,
                 target_type, target_faction, destination_system, destination_station,
                 destination_settlement, redirected_system, redirected_station,
                 redirected_settlement, count, kill_count, passenger_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)";
        self.conn
            .execute(
                QUERY,
                params![
                    mission.mission_id as i64,
                    mission.status.as_sql_text(),
                    format_timestamp(mission.expiry),
                    mission.faction,
                    mission.mission_type,
                    mission.description,
                    mission.reward as i64,
                    mission.target,
                    mission.target_type,
                    mission.target_faction,
                    mission.destination_system,
                    mission.destination_station,
                    mission.destination_settlement,
                    mission.redirected_system,
                    mission.redirected_station,
                    mission.redirected_settlement,
                    mission.count,
                    mission.kill_count,
                    mission.passenger_count,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn change_mission_status(&self, mission_id: MissionId, status: MissionStatus) -> Result<(), StorageError> {
        const QUERY: &str = "UPDATE mission SET status=?1 WHERE mission_id=?2";
        self.conn
            .execute(QUERY, params![status.as_sql_text(), mission_id as i64])
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    pub fn redirect_mission(
        &self,
        mission_id: MissionId,
        system: &str,
        station: &str,
        settlement: &str,
    ) -> Result<(), StorageError> {
        const QUERY: &str = "UPDATE mission SET status=?1, redirected_system=?2, redirected_station=?3,
                                 redirected_settlement=?4
             WHERE mission_id=?5";
        self.conn
            .execute(
                QUERY,
                params![
                    MissionStatus::Redirected.as_sql_text(),
                    system,
                    station,
                    settlement,
                    mission_id as i64,
                ],
            )
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        Ok(())
    }

    /// `status='accepted' AND expiry > now()` OR `status='redirected'`.
    pub fn load_missions(&self) -> Result<Vec<Mission>, StorageError> {
        const QUERY: &str = "SELECT mission_id, status, expiry, faction, mission_type, description, reward, target,
                    target_type, target_faction, destination_system, destination_station,
                    destination_settlement, redirected_system, redirected_station,
                    redirected_settlement, count, kill_count, passenger_count
             FROM mission
             WHERE (status='accepted' AND expiry > ?1) OR status='redirected'";
        let now = format_timestamp(OffsetDateTime::now_utc());
        let mut stmt = self.conn.prepare(QUERY).map_err(|e| StorageError::bad_message(QUERY, e))?;
        let rows = stmt
            .query_map(params![now], |row| {
                let expiry_text: String = row.get(2)?;
                Ok(Mission {
                    mission_id: row.get::<_, i64>(0)? as u64,
                    status: MissionStatus::from_sql_text(&row.get::<_, String>(1)?),
                    expiry: parse_timestamp(&expiry_text),
                    faction: row.get(3)?,
                    mission_type: row.get(4)?,
                    description: row.get(5)?,
                    reward: row.get::<_, i64>(6)? as u64,
                    target: row.get(7)?,
                    target_type: row.get(8)?,
                    target_faction: row.get(9)?,
                    destination_system: row.get(10)?,
                    destination_station: row.get(11)?,
                    destination_settlement: row.get(12)?,
                    redirected_system: row.get(13)?,
                    redirected_station: row.get(14)?,
                    redirected_settlement: row.get(15)?,
                    count: row.get(16)?,
                    kill_count: row.get(17)?,
                    passenger_count: row.get(18)?,
                })
            })
            .map_err(|e| StorageError::bad_message(QUERY, e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StorageError::bad_message(QUERY, e))
    }
}

fn parse_timestamp(text: &str) -> OffsetDateTime {
    time::PrimitiveDateTime::parse(text, schema::TIMESTAMP_FORMAT)
        .map(|dt| dt.assume_utc())
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH)
}
