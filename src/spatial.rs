use crate::types::DistrictRegion;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};

// Bounding box of one region, pointing back into the region slice
struct RegionEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// R-tree over district bounding boxes for coordinate to district lookup.
pub struct RegionIndex {
    tree: RTree<RegionEnvelope>,
}

impl RegionIndex {
    pub fn build(regions: &[DistrictRegion]) -> Self {
        let items: Vec<RegionEnvelope> = regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| {
                // Empty geometries have no bounding box and can never contain a point.
                let rect = region.geometry.bounding_rect()?;
                Some(RegionEnvelope {
                    index,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(items),
        }
    }

    /// `regions` must be the slice the index was built from.
    pub fn locate<'a>(&self, regions: &'a [DistrictRegion], x: f64, y: f64) -> Option<&'a DistrictRegion> {
        let point = Point::new(x, y);
        let envelope = AABB::from_point([x, y]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| regions.get(candidate.index))
            .find(|region| region.geometry.contains(&point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(code: u32, x0: f64, y0: f64) -> DistrictRegion {
        DistrictRegion {
            code,
            name: format!("District {}", code),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + 1.0, y: y0),
                (x: x0 + 1.0, y: y0 + 1.0),
                (x: x0, y: y0 + 1.0),
                (x: x0, y: y0),
            ]]),
        }
    }

    #[test]
    fn locates_the_containing_region() {
        let regions = vec![square(901, 0.0, 0.0), square(902, 1.0, 0.0), square(903, 0.0, 1.0)];
        let index = RegionIndex::build(&regions);

        assert_eq!(index.locate(&regions, 1.5, 0.5).map(|r| r.code), Some(902));
        assert_eq!(index.locate(&regions, 0.25, 1.75).map(|r| r.code), Some(903));
        assert!(index.locate(&regions, 5.0, 5.0).is_none());
    }

    #[test]
    fn empty_geometry_is_never_indexed() {
        let regions = vec![DistrictRegion {
            code: 901,
            name: "empty".to_string(),
            geometry: MultiPolygon::new(Vec::new()),
        }];
        let index = RegionIndex::build(&regions);
        assert!(index.locate(&regions, 0.0, 0.0).is_none());
    }
}
