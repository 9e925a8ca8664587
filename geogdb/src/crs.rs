//! Systèmes de coordonnées et reprojection légère en Rust pur
//!
//! Supporte les systèmes utilisés par les géodatabases de sols:
//! - WGS84 (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - CONUS Albers équivalente (EPSG:5070, formulation sphérique)
//!
//! Toutes les transformations passent par les coordonnées géographiques.

use std::fmt;
use std::str::FromStr;

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::GdbError;

/// Rayon de la sphère de référence (Snyder)
const SPHERE_R: f64 = 6_370_997.0;

/// Demi-grand axe WGS84 (modèle sphérique du Web Mercator)
const WGS84_A: f64 = 6_378_137.0;

/// Système de coordonnées identifié par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpatialRef {
    pub epsg: u32,
}

impl SpatialRef {
    pub const WGS84: SpatialRef = SpatialRef { epsg: 4326 };
    pub const WEB_MERCATOR: SpatialRef = SpatialRef { epsg: 3857 };
    pub const CONUS_ALBERS: SpatialRef = SpatialRef { epsg: 5070 };

    pub fn new(epsg: u32) -> Self {
        Self { epsg }
    }

    /// Vérifie si l'EPSG est supporté par les transformations
    pub fn is_supported(&self) -> bool {
        matches!(self.epsg, 4326 | 3857 | 5070)
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for SpatialRef {
    type Err = GdbError;

    /// Accepte `"EPSG:5070"` (insensible à la casse) ou `"5070"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let code = code
            .strip_prefix("EPSG:")
            .or_else(|| code.strip_prefix("epsg:"))
            .unwrap_or(code);
        let epsg: u32 = code
            .parse()
            .map_err(|_| GdbError::UnsupportedCrs(0))?;
        Ok(Self { epsg })
    }
}

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
struct Geographic {
    lon: f64,
    lat: f64,
}

impl Geographic {
    fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }

    fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }
}

/// Paramètres CONUS Albers (EPSG:5070): parallèles standards 29.5°/45.5°,
/// origine 23°N 96°W, pas de false easting/northing.
struct ConusAlbers {
    n: f64,
    c: f64,
    rho0: f64,
    lon0: f64,
}

impl ConusAlbers {
    fn new() -> Self {
        let lat1 = 29.5_f64.to_radians();
        let lat2 = 45.5_f64.to_radians();
        let lat0 = 23.0_f64.to_radians();
        let lon0 = (-96.0_f64).to_radians();

        // Constantes de la projection conique équivalente (Snyder, sphère)
        let n = (lat1.sin() + lat2.sin()) / 2.0;
        let c = lat1.cos().powi(2) + 2.0 * n * lat1.sin();
        let rho0 = SPHERE_R * (c - 2.0 * n * lat0.sin()).sqrt() / n;

        Self { n, c, rho0, lon0 }
    }

    fn rho(&self, lat: f64) -> f64 {
        SPHERE_R * (self.c - 2.0 * self.n * lat.sin()).sqrt() / self.n
    }

    fn forward(&self, geo: Geographic) -> (f64, f64) {
        let theta = self.n * (geo.lon - self.lon0);
        let rho = self.rho(geo.lat);
        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> Geographic {
        let rho = (x.powi(2) + (self.rho0 - y).powi(2)).sqrt();
        let theta = x.atan2(self.rho0 - y);
        let sin_lat = (self.c - (rho * self.n / SPHERE_R).powi(2)) / (2.0 * self.n);
        Geographic {
            lon: self.lon0 + theta / self.n,
            lat: sin_lat.clamp(-1.0, 1.0).asin(),
        }
    }
}

/// Convertit coordonnées géographiques vers Web Mercator (EPSG:3857)
fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    // Limiter la latitude pour éviter l'infini
    let lat = geo.lat.clamp(-85.0_f64.to_radians(), 85.0_f64.to_radians());
    let x = WGS84_A * geo.lon;
    let y = WGS84_A * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// Convertit Web Mercator vers coordonnées géographiques
fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    Geographic {
        lon: x / WGS84_A,
        lat: 2.0 * (y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2,
    }
}

/// Transformation de coordonnées entre deux systèmes supportés
pub struct CrsTransform {
    source: SpatialRef,
    target: SpatialRef,
}

impl CrsTransform {
    /// Crée une transformation entre deux EPSG supportés
    pub fn new(source: SpatialRef, target: SpatialRef) -> Result<Self, GdbError> {
        if !source.is_supported() {
            return Err(GdbError::UnsupportedCrs(source.epsg));
        }
        if !target.is_supported() {
            return Err(GdbError::UnsupportedCrs(target.epsg));
        }
        Ok(Self { source, target })
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_identity() {
            return (x, y);
        }
        let geo = match self.source.epsg {
            4326 => Geographic::from_degrees(x, y),
            3857 => web_mercator_to_geographic(x, y),
            5070 => ConusAlbers::new().inverse(x, y),
            _ => unreachable!("unsupported source checked at construction"),
        };
        match self.target.epsg {
            4326 => geo.to_degrees(),
            3857 => geographic_to_web_mercator(geo),
            5070 => ConusAlbers::new().forward(geo),
            _ => unreachable!("unsupported target checked at construction"),
        }
    }

    fn transform_coord(&self, c: Coord) -> Coord {
        let (x, y) = self.transform_point(c.x, c.y);
        Coord { x, y }
    }

    fn transform_linestring(&self, ls: &LineString) -> LineString {
        LineString::new(ls.coords().map(|c| self.transform_coord(*c)).collect())
    }

    fn transform_polygon(&self, p: &Polygon) -> Polygon {
        Polygon::new(
            self.transform_linestring(p.exterior()),
            p.interiors()
                .iter()
                .map(|r| self.transform_linestring(r))
                .collect(),
        )
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GdbError> {
        if self.is_identity() {
            return Ok(geom.clone());
        }
        match geom {
            Geometry::Point(p) => Ok(Geometry::Point(Point(self.transform_coord(p.0)))),
            Geometry::LineString(ls) => Ok(Geometry::LineString(self.transform_linestring(ls))),
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p))),
            Geometry::MultiPoint(mp) => Ok(Geometry::MultiPoint(MultiPoint::new(
                mp.iter().map(|p| Point(self.transform_coord(p.0))).collect(),
            ))),
            Geometry::MultiLineString(mls) => Ok(Geometry::MultiLineString(MultiLineString::new(
                mls.iter().map(|ls| self.transform_linestring(ls)).collect(),
            ))),
            Geometry::MultiPolygon(mp) => Ok(Geometry::MultiPolygon(MultiPolygon::new(
                mp.iter().map(|p| self.transform_polygon(p)).collect(),
            ))),
            _ => Err(GdbError::UnsupportedGeometry {
                dataset: String::new(),
                reason: "geometry collections cannot be reprojected".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spatial_ref() {
        assert_eq!("EPSG:5070".parse::<SpatialRef>().unwrap().epsg, 5070);
        assert_eq!("4326".parse::<SpatialRef>().unwrap().epsg, 4326);
        assert!("EPSG:abc".parse::<SpatialRef>().is_err());
    }

    #[test]
    fn test_albers_origin() {
        // L'origine de la projection (96°W, 23°N) tombe sur (0, 0)
        let t = CrsTransform::new(SpatialRef::WGS84, SpatialRef::CONUS_ALBERS).unwrap();
        let (x, y) = t.transform_point(-96.0, 23.0);
        assert!(x.abs() < 1e-6, "x={}", x);
        assert!(y.abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_albers_madison() {
        // Madison, WI: 89.4°W, 43.07°N
        let t = CrsTransform::new(SpatialRef::WGS84, SpatialRef::CONUS_ALBERS).unwrap();
        let (x, y) = t.transform_point(-89.4, 43.07);
        assert!((x - 532_777.6).abs() < 1.0, "x={}", x);
        assert!((y - 2_254_764.2).abs() < 1.0, "y={}", y);
    }

    #[test]
    fn test_albers_roundtrip() {
        let fwd = CrsTransform::new(SpatialRef::WGS84, SpatialRef::CONUS_ALBERS).unwrap();
        let inv = CrsTransform::new(SpatialRef::CONUS_ALBERS, SpatialRef::WGS84).unwrap();
        let (x, y) = fwd.transform_point(-90.25, 44.5);
        let (lon, lat) = inv.transform_point(x, y);
        assert!((lon + 90.25).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 44.5).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_web_mercator_known_point() {
        // 90°W, 45°N
        let t = CrsTransform::new(SpatialRef::WGS84, SpatialRef::WEB_MERCATOR).unwrap();
        let (x, y) = t.transform_point(-90.0, 45.0);
        assert!((x + 10_018_754.17).abs() < 1.0, "x={}", x);
        assert!((y - 5_621_521.49).abs() < 1.0, "y={}", y);
    }

    #[test]
    fn test_mercator_to_albers_via_geographic() {
        let to_merc = CrsTransform::new(SpatialRef::WGS84, SpatialRef::WEB_MERCATOR).unwrap();
        let cross = CrsTransform::new(SpatialRef::WEB_MERCATOR, SpatialRef::CONUS_ALBERS).unwrap();
        let direct = CrsTransform::new(SpatialRef::WGS84, SpatialRef::CONUS_ALBERS).unwrap();

        let (mx, my) = to_merc.transform_point(-89.4, 43.07);
        let (x1, y1) = cross.transform_point(mx, my);
        let (x2, y2) = direct.transform_point(-89.4, 43.07);
        assert!((x1 - x2).abs() < 1e-3);
        assert!((y1 - y2).abs() < 1e-3);
    }

    #[test]
    fn test_identity_transform() {
        let t = CrsTransform::new(SpatialRef::WGS84, SpatialRef::WGS84).unwrap();
        assert!(t.is_identity());
        let (x, y) = t.transform_point(-89.4, 43.07);
        assert_eq!((x, y), (-89.4, 43.07));
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(CrsTransform::new(SpatialRef::new(2154), SpatialRef::WGS84).is_err());
        assert!(CrsTransform::new(SpatialRef::WGS84, SpatialRef::new(99999)).is_err());
    }

    #[test]
    fn test_polygon_transform_preserves_rings() {
        let t = CrsTransform::new(SpatialRef::WGS84, SpatialRef::CONUS_ALBERS).unwrap();
        let poly = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (-90.0, 44.0),
                (-89.9, 44.0),
                (-89.9, 44.1),
                (-90.0, 44.1),
                (-90.0, 44.0),
            ]),
            vec![],
        ));
        if let Geometry::Polygon(p) = t.transform_geometry(&poly).unwrap() {
            assert_eq!(p.exterior().0.len(), 5);
            assert!(p.exterior().0[0].x > 400_000.0);
        } else {
            panic!("Expected Polygon geometry");
        }
    }
}
