use crate::config::SimConfig;
use crate::geometry::{GeoPoint, GeometryError, GeometryService, Polygon};
use crate::ledger::NationLedger;
use crate::scheduler::Simulation;
use crate::state::{AgreementKind, Country, Date, Fortification, PlayerNation, WarOrigin};
use std::collections::BTreeMap;

/// Builds a ledger (or a whole simulation) for tests. The player is `PLY`.
pub struct WorldBuilder {
    date: Date,
    player: PlayerNation,
    countries: Vec<Country>,
    agreements: Vec<(String, String, AgreementKind)>,
    wars: Vec<(String, String)>,
    fortifications: Vec<Fortification>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            date: Date::default(),
            player: PlayerNation::new("PLY", "Player"),
            countries: Vec::new(),
            agreements: Vec::new(),
            wars: Vec::new(),
            fortifications: Vec::new(),
        }
    }

    pub fn date(mut self, year: i32, month: u8, day: u8) -> Self {
        self.date = Date::new(year, month, day);
        self
    }

    pub fn with_player(mut self, f: impl FnOnce(&mut PlayerNation)) -> Self {
        f(&mut self.player);
        self
    }

    pub fn with_country(self, code: &str) -> Self {
        self.with_custom_country(code, |_| {})
    }

    pub fn with_country_relations(self, code: &str, score: f64) -> Self {
        self.with_custom_country(code, |c| c.relations.set(score))
    }

    /// Adds a default country and lets `f` adjust it. Power is recomputed afterwards.
    pub fn with_custom_country(mut self, code: &str, f: impl FnOnce(&mut Country)) -> Self {
        let mut country = Country::new(code, code);
        f(&mut country);
        country.recompute_power();
        self.countries.push(country);
        self
    }

    pub fn with_alliance(self, a: &str, b: &str) -> Self {
        self.with_agreement(a, b, AgreementKind::MilitaryAlliance)
    }

    pub fn with_agreement(mut self, a: &str, b: &str, kind: AgreementKind) -> Self {
        self.agreements.push((a.to_string(), b.to_string(), kind));
        self
    }

    pub fn with_war(mut self, attacker: &str, defender: &str) -> Self {
        self.wars.push((attacker.to_string(), defender.to_string()));
        self
    }

    pub fn with_fortification(mut self, owner: &str, lat: f64, lon: f64, bonus: f64) -> Self {
        let id = self.fortifications.len() as u32 + 1;
        self.fortifications.push(Fortification {
            id,
            owner: owner.to_string(),
            location: GeoPoint::new(lat, lon),
            bonus,
        });
        self
    }

    pub fn build_ledger(self) -> NationLedger {
        let mut ledger = NationLedger::new(self.player);
        for country in self.countries {
            ledger.upsert_country(country, self.date);
        }
        for (a, b, kind) in self.agreements {
            ledger.sign_agreement(kind, &a, &b, self.date);
        }
        for (attacker, defender) in self.wars {
            ledger.open_war(&attacker, &defender, WarOrigin::Declaration, self.date);
        }
        ledger.fortifications = self.fortifications;
        ledger
    }

    pub fn build_simulation(
        self,
        config: SimConfig,
        geometry: impl GeometryService + 'static,
    ) -> Simulation {
        let date = self.date;
        Simulation::new(config, self.build_ledger(), Box::new(geometry), date)
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat-plane geometry for tests.
///
/// Distances are Euclidean in degrees × 111 km. Polygon areas and country
/// overlaps come from fixed tables; anything missing is an error, which lets
/// tests exercise the degraded paths.
#[derive(Debug, Clone, Default)]
pub struct StubGeometry {
    pub country_areas: BTreeMap<String, f64>,
    /// Overlap of any claim polygon with the country, in km²
    pub overlaps: BTreeMap<String, f64>,
    pub frontline: Option<GeoPoint>,
    pub polygon_area: Option<f64>,
}

impl StubGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country_area(mut self, code: &str, km2: f64) -> Self {
        self.country_areas.insert(code.to_string(), km2);
        self
    }

    pub fn with_overlap(mut self, code: &str, km2: f64) -> Self {
        self.overlaps.insert(code.to_string(), km2);
        self
    }

    pub fn with_frontline(mut self, lat: f64, lon: f64) -> Self {
        self.frontline = Some(GeoPoint::new(lat, lon));
        self
    }
}

impl GeometryService for StubGeometry {
    fn area_km2(&self, polygon: &Polygon) -> Result<f64, GeometryError> {
        if polygon.points.is_empty() {
            return Err(GeometryError::Empty);
        }
        Ok(self
            .polygon_area
            .unwrap_or_else(|| self.overlaps.values().sum()))
    }

    fn intersection_km2(&self, _polygon: &Polygon, country: &str) -> Result<f64, GeometryError> {
        Ok(self.overlaps.get(country).copied().unwrap_or(0.0))
    }

    fn country_area_km2(&self, country: &str) -> Result<f64, GeometryError> {
        self.country_areas
            .get(country)
            .copied()
            .ok_or_else(|| GeometryError::UnknownShape(country.to_string()))
    }

    fn centroid(&self, polygon: &Polygon) -> Result<GeoPoint, GeometryError> {
        let n = polygon.points.len();
        if n == 0 {
            return Err(GeometryError::Empty);
        }
        let (lat, lon) = polygon
            .points
            .iter()
            .fold((0.0, 0.0), |(la, lo), p| (la + p.lat, lo + p.lon));
        Ok(GeoPoint::new(lat / n as f64, lon / n as f64))
    }

    fn frontline(&self, _attacker: &str, _defender: &str) -> Result<GeoPoint, GeometryError> {
        self.frontline.ok_or(GeometryError::Empty)
    }

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> Result<f64, GeometryError> {
        Ok(((a.lat - b.lat).powi(2) + (a.lon - b.lon).powi(2)).sqrt() * 111.0)
    }
}

/// Geometry service that fails every query.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingGeometry;

impl FailingGeometry {
    fn offline<T>() -> Result<T, GeometryError> {
        Err(GeometryError::Failed("offline".into()))
    }
}

impl GeometryService for FailingGeometry {
    fn area_km2(&self, _: &Polygon) -> Result<f64, GeometryError> {
        Self::offline()
    }

    fn intersection_km2(&self, _: &Polygon, _: &str) -> Result<f64, GeometryError> {
        Self::offline()
    }

    fn country_area_km2(&self, _: &str) -> Result<f64, GeometryError> {
        Self::offline()
    }

    fn centroid(&self, _: &Polygon) -> Result<GeoPoint, GeometryError> {
        Self::offline()
    }

    fn frontline(&self, _: &str, _: &str) -> Result<GeoPoint, GeometryError> {
        Self::offline()
    }

    fn distance_km(&self, _: GeoPoint, _: GeoPoint) -> Result<f64, GeometryError> {
        Self::offline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let ledger = WorldBuilder::default()
            .with_country_relations("AAA", 60.0)
            .with_country("BBB")
            .with_alliance("AAA", "BBB")
            .with_war("PLY", "BBB")
            .build_ledger();

        assert_eq!(ledger.country("AAA").unwrap().relations.get(), 60.0);
        assert!(ledger.country("BBB").unwrap().allies.contains("AAA"));
        assert!(ledger.is_at_war("BBB"));
        assert!(!ledger.is_at_war("AAA"));
    }

    #[test]
    fn test_stub_geometry_fails_for_unknown_shapes() {
        let geo = StubGeometry::new().with_country_area("AAA", 1000.0);
        assert_eq!(geo.country_area_km2("AAA"), Ok(1000.0));
        assert!(geo.country_area_km2("ZZZ").is_err());
        assert!(geo.frontline("AAA", "BBB").is_err());
    }
}
