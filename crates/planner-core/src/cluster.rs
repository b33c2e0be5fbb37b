//! Geographic clusterer: partitions sites into bounded-diameter groups (§4.2).

use crate::geo::{bounding_diameter, centroid, distance_miles, LatLon};
use crate::types::Site;

/// Named diameter presets (miles), accepted alongside arbitrary values.
pub mod presets {
    pub const TIGHT: f64 = 50.0;
    pub const MEDIUM: f64 = 75.0;
    pub const NORMAL: f64 = 100.0;
    pub const LOOSE: f64 = 150.0;
}

/// A group of sites whose bounding diameter is <= the configured cap.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub cluster_id: u32,
    pub site_ids: Vec<String>,
}

struct Group {
    site_indices: Vec<usize>,
}

impl Group {
    fn points(&self, locations: &[LatLon]) -> Vec<LatLon> {
        self.site_indices.iter().map(|&i| locations[i]).collect()
    }
}

/// Agglomerative diameter-bounded clusterer (§4.2 algorithm).
///
/// Repeatedly merges the pair of groups whose merged diameter is smallest
/// and still <= `max_diameter_miles`, breaking ties by centroid distance,
/// until no legal merge remains. The trivial one-site-per-cluster partition
/// is always diameter-feasible, so this never fails.
pub fn cluster_sites(sites: &[Site], max_diameter_miles: f64) -> Vec<Cluster> {
    if sites.is_empty() {
        return Vec::new();
    }

    let locations: Vec<LatLon> = sites.iter().map(Site::location).collect();
    let mut groups: Vec<Group> = (0..sites.len())
        .map(|i| Group {
            site_indices: vec![i],
        })
        .collect();

    loop {
        let mut best: Option<(usize, usize, f64, f64)> = None; // (i, j, diameter, centroid_dist)

        for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                let mut merged_points = groups[i].points(&locations);
                merged_points.extend(groups[j].points(&locations));
                let diameter = bounding_diameter(&merged_points);
                if diameter > max_diameter_miles {
                    continue;
                }
                let ci = centroid(&groups[i].points(&locations));
                let cj = centroid(&groups[j].points(&locations));
                let centroid_dist = distance_miles(ci, cj);

                let better = match &best {
                    None => true,
                    Some((_, _, best_diameter, best_centroid_dist)) => {
                        diameter < *best_diameter
                            || (diameter == *best_diameter && centroid_dist < *best_centroid_dist)
                    }
                };
                if better {
                    best = Some((i, j, diameter, centroid_dist));
                }
            }
        }

        match best {
            Some((i, j, _, _)) => {
                let group_j = groups.remove(j);
                groups[i].site_indices.extend(group_j.site_indices);
            }
            None => break,
        }
    }

    // Stable numbering: decreasing cluster size, ties by smallest centroid
    // (lat, then lon).
    let numbered: Vec<(usize, LatLon)> = groups
        .iter()
        .map(|g| (g.site_indices.len(), centroid(&g.points(&locations))))
        .collect();
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by(|&a, &b| {
        numbered[b]
            .0
            .cmp(&numbered[a].0)
            .then_with(|| numbered[a].1 .0.partial_cmp(&numbered[b].1 .0).unwrap())
            .then_with(|| numbered[a].1 .1.partial_cmp(&numbered[b].1 .1).unwrap())
    });

    order
        .into_iter()
        .enumerate()
        .map(|(cluster_id, group_idx)| Cluster {
            cluster_id: cluster_id as u32,
            site_ids: groups[group_idx]
                .site_indices
                .iter()
                .map(|&i| sites[i].id.clone())
                .collect(),
        })
        .collect()
}
