//! Typed feature geometry and spatial helpers.

use std::collections::HashMap;

use geo::{Coord, EuclideanDistance, EuclideanLength, Geometry, LineString, Point, Polygon};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// GeoPackage geometry type name.
    pub fn gpkg_name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
        }
    }

    /// OGC WKB geometry type code of the single-part 2D type.
    pub fn wkb_code(&self) -> u32 {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon => 3,
        }
    }

    /// Accepts ISO Z/M codes (1000s), the 2.5D flag and Multi* types.
    pub fn from_wkb_code(code: u32) -> Option<Self> {
        match (code & 0x0fff_ffff) % 1000 {
            1 | 4 => Some(GeometryKind::Point),
            2 | 5 => Some(GeometryKind::LineString),
            3 | 6 => Some(GeometryKind::Polygon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl FeatureGeometry {
    pub fn point(x: f64, y: f64) -> Self {
        FeatureGeometry::Point(Point::new(x, y))
    }

    pub fn line(coords: Vec<(f64, f64)>) -> Self {
        FeatureGeometry::LineString(LineString::from(coords))
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            FeatureGeometry::Point(_) => GeometryKind::Point,
            FeatureGeometry::LineString(_) => GeometryKind::LineString,
            FeatureGeometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn as_point(&self) -> Option<Point<f64>> {
        match self {
            FeatureGeometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineString<f64>> {
        match self {
            FeatureGeometry::LineString(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon<f64>> {
        match self {
            FeatureGeometry::Polygon(p) => Some(p),
            _ => None,
        }
    }

    /// Vertices in order (polygon: exterior ring).
    pub fn coords(&self) -> Vec<Coord<f64>> {
        match self {
            FeatureGeometry::Point(p) => vec![p.0],
            FeatureGeometry::LineString(l) => l.0.clone(),
            FeatureGeometry::Polygon(p) => p.exterior().0.clone(),
        }
    }

    /// Single-part geometry from any geo geometry; Multi* keep their first part.
    pub fn from_geo(geometry: Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Point(p) => Some(FeatureGeometry::Point(p)),
            Geometry::LineString(l) => Some(FeatureGeometry::LineString(l)),
            Geometry::Line(l) => Some(FeatureGeometry::LineString(LineString::from(vec![
                l.start, l.end,
            ]))),
            Geometry::Polygon(p) => Some(FeatureGeometry::Polygon(p)),
            Geometry::MultiPoint(m) => m.0.into_iter().next().map(FeatureGeometry::Point),
            Geometry::MultiLineString(m) => {
                m.0.into_iter().next().map(FeatureGeometry::LineString)
            }
            Geometry::MultiPolygon(m) => m.0.into_iter().next().map(FeatureGeometry::Polygon),
            Geometry::GeometryCollection(c) => c.0.into_iter().find_map(Self::from_geo),
            Geometry::Rect(r) => Some(FeatureGeometry::Polygon(r.to_polygon())),
            Geometry::Triangle(t) => Some(FeatureGeometry::Polygon(t.to_polygon())),
        }
    }

    pub fn to_geo(&self) -> Geometry<f64> {
        match self {
            FeatureGeometry::Point(p) => Geometry::Point(*p),
            FeatureGeometry::LineString(l) => Geometry::LineString(l.clone()),
            FeatureGeometry::Polygon(p) => Geometry::Polygon(p.clone()),
        }
    }

    /// A representative location: the point itself or the first vertex.
    pub fn anchor(&self) -> Option<Coord<f64>> {
        self.coords().first().copied()
    }
}

pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Point::from(a).euclidean_distance(&Point::from(b))
}

pub fn coords_close(a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> bool {
    distance(a, b) <= tolerance
}

pub fn line_length(line: &LineString<f64>) -> f64 {
    line.euclidean_length()
}

/// Uniform grid over points for tolerance lookups.
#[derive(Debug, Clone)]
pub struct SnapIndex {
    cell: f64,
    points: Vec<Coord<f64>>,
    grid: HashMap<(i64, i64), Vec<usize>>,
}

impl SnapIndex {
    pub fn new(tolerance: f64) -> Self {
        Self {
            cell: tolerance.max(1e-9),
            points: Vec::new(),
            grid: HashMap::new(),
        }
    }

    fn cell_of(&self, c: Coord<f64>) -> (i64, i64) {
        (
            (c.x / self.cell).floor() as i64,
            (c.y / self.cell).floor() as i64,
        )
    }

    /// Inserts a point and returns its id (insertion order).
    pub fn insert(&mut self, c: Coord<f64>) -> usize {
        let id = self.points.len();
        self.points.push(c);
        let key = self.cell_of(c);
        self.grid.entry(key).or_default().push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, id: usize) -> Coord<f64> {
        self.points[id]
    }

    /// All ids within `tolerance` (which must not exceed the index cell).
    pub fn within(&self, c: Coord<f64>, tolerance: f64) -> Vec<usize> {
        let (cx, cy) = self.cell_of(c);
        let reach = (tolerance / self.cell).ceil().max(1.0) as i64;
        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(ids) = self.grid.get(&(cx + dx, cy + dy)) {
                    found.extend(
                        ids.iter()
                            .copied()
                            .filter(|&id| coords_close(self.points[id], c, tolerance)),
                    );
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Closest id within `tolerance`; ties go to the earliest inserted.
    pub fn nearest_within(&self, c: Coord<f64>, tolerance: f64) -> Option<(usize, f64)> {
        self.within(c, tolerance)
            .into_iter()
            .map(|id| (id, distance(self.points[id], c)))
            .fold(None, |best: Option<(usize, f64)>, cand| match best {
                Some(b) if b.1 <= cand.1 => Some(b),
                _ => Some(cand),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_length_and_anchor() {
        let g = FeatureGeometry::line(vec![(0.0, 0.0), (3.0, 4.0)]);
        assert_eq!(g.kind(), GeometryKind::LineString);
        assert!((line_length(g.as_line().unwrap()) - 5.0).abs() < 1e-12);
        assert_eq!(g.anchor(), Some(Coord { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn snap_index_finds_neighbours_across_cells() {
        let mut idx = SnapIndex::new(0.5);
        let a = idx.insert(Coord { x: 0.49, y: 0.0 });
        let _b = idx.insert(Coord { x: 10.0, y: 10.0 });
        let c = idx.insert(Coord { x: 0.51, y: 0.0 });
        let hits = idx.within(Coord { x: 0.5, y: 0.0 }, 0.5);
        assert_eq!(hits, vec![a, c]);
        assert_eq!(idx.nearest_within(Coord { x: 0.52, y: 0.0 }, 0.5).map(|h| h.0), Some(c));
        assert!(idx.nearest_within(Coord { x: 5.0, y: 5.0 }, 0.5).is_none());
    }

    #[test]
    fn wkb_codes_flatten_to_kinds() {
        assert_eq!(GeometryKind::from_wkb_code(5), Some(GeometryKind::LineString));
        assert_eq!(GeometryKind::from_wkb_code(1001), Some(GeometryKind::Point));
        assert_eq!(GeometryKind::from_wkb_code(0x8000_0003), Some(GeometryKind::Polygon));
        assert_eq!(GeometryKind::from_wkb_code(7), None);
        assert_eq!(GeometryKind::from_wkb_code(100), None);
        assert_eq!(GeometryKind::Polygon.wkb_code(), 3);
    }

    #[test]
    fn multi_parts_keep_the_first() {
        let multi = Geometry::MultiLineString(geo::MultiLineString(vec![
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
            LineString::from(vec![(5.0, 5.0), (6.0, 6.0)]),
        ]));
        let g = FeatureGeometry::from_geo(multi).unwrap();
        assert_eq!(g, FeatureGeometry::line(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert_eq!(FeatureGeometry::from_geo(g.to_geo()), Some(g));
        assert_eq!(
            FeatureGeometry::from_geo(Geometry::MultiPoint(geo::MultiPoint(vec![]))),
            None
        );
    }
}
