//! Connected-component labeling and small-region merging.

use std::collections::HashMap;

use thiserror::Error;

use super::{Neighborhood, TemplateConfig};

#[derive(Debug, Error)]
pub enum TemplateGenerationError {
    #[error("Too few paintable regions: found {found}, need at least 2")]
    TooFewRegions { found: usize },

    #[error("Assignment buffer does not match dimensions: {len} pixels for {width}x{height}")]
    DimensionMismatch { len: usize, width: u32, height: u32 },
}

/// One paintable region of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Dense 1-based label, ordered by descending area.
    pub label: u32,
    /// Quantizer cluster this region is painted with.
    pub cluster: u32,
    /// Region size in pixels.
    pub area: u32,
}

/// Labeled template ready for rendering.
#[derive(Debug, Clone)]
pub struct Template {
    pub width: u32,
    pub height: u32,
    /// Per-pixel region label in `1..=regions.len()`, row-major.
    pub labels: Vec<u32>,
    /// Regions sorted by label, i.e. by strictly non-increasing area.
    pub regions: Vec<Region>,
}

impl Template {
    pub fn region_count(&self) -> u32 {
        self.regions.len() as u32
    }

    /// Distinct clusters still present after small-region merging.
    pub fn surviving_clusters(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for region in &self.regions {
            if !seen.contains(&region.cluster) {
                seen.push(region.cluster);
            }
        }
        seen
    }
}

/// Build paintable regions from per-pixel cluster assignments.
///
/// Connected components of equal cluster are found first, then components
/// below `min_region_area` are absorbed into their most common neighboring
/// component, smallest first. Survivors get dense labels starting at 1,
/// largest region first.
pub fn build_template(
    assignments: &[u32],
    width: u32,
    height: u32,
    config: &TemplateConfig,
) -> Result<Template, TemplateGenerationError> {
    let len = (width as usize) * (height as usize);
    if assignments.len() != len || len == 0 {
        return Err(TemplateGenerationError::DimensionMismatch {
            len: assignments.len(),
            width,
            height,
        });
    }

    let mut components = label_components(assignments, width, height, config.neighborhood);
    merge_small_components(&mut components, config.min_region_area);

    let mut roots: Vec<usize> = (0..components.parent.len())
        .filter(|&i| components.parent[i] == i)
        .collect();
    if roots.len() < 2 {
        return Err(TemplateGenerationError::TooFewRegions { found: roots.len() });
    }

    // First-pixel scan index per root, used as the ordering tie breaker.
    let mut first_pixel: HashMap<usize, usize> = HashMap::new();
    for (i, comp) in components.pixel_component.iter().enumerate() {
        let root = components.find(*comp);
        first_pixel.entry(root).or_insert(i);
    }

    roots.sort_by(|&a, &b| {
        components.area[b]
            .cmp(&components.area[a])
            .then(first_pixel[&a].cmp(&first_pixel[&b]))
    });

    let mut root_label: HashMap<usize, u32> = HashMap::new();
    let mut regions = Vec::with_capacity(roots.len());
    for (i, &root) in roots.iter().enumerate() {
        let label = (i + 1) as u32;
        root_label.insert(root, label);
        regions.push(Region {
            label,
            cluster: components.cluster[root],
            area: components.area[root],
        });
    }

    let labels = components
        .pixel_component
        .iter()
        .map(|&comp| root_label[&components.find(comp)])
        .collect();

    Ok(Template {
        width,
        height,
        labels,
        regions,
    })
}

struct Components {
    /// Component id per pixel, as assigned by the initial labeling pass.
    pixel_component: Vec<usize>,
    /// Union-find parents over component ids.
    parent: Vec<usize>,
    area: Vec<u32>,
    cluster: Vec<u32>,
    /// Boundary pixel-pair counts between root components.
    adjacency: Vec<HashMap<usize, u64>>,
}

impl Components {
    fn find(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }
}

fn label_components(
    assignments: &[u32],
    width: u32,
    height: u32,
    neighborhood: Neighborhood,
) -> Components {
    let w = width as usize;
    let h = height as usize;
    const UNLABELED: usize = usize::MAX;
    let mut pixel_component = vec![UNLABELED; w * h];
    let mut area = Vec::new();
    let mut cluster = Vec::new();
    let mut queue = Vec::new();

    for start in 0..w * h {
        if pixel_component[start] != UNLABELED {
            continue;
        }
        let comp = area.len();
        let comp_cluster = assignments[start];
        area.push(0u32);
        cluster.push(comp_cluster);

        queue.clear();
        queue.push(start);
        pixel_component[start] = comp;
        while let Some(idx) = queue.pop() {
            area[comp] += 1;
            let x = idx % w;
            let y = idx / w;
            for (nx, ny) in neighbors(x, y, w, h, neighborhood) {
                let nidx = ny * w + nx;
                if pixel_component[nidx] == UNLABELED && assignments[nidx] == comp_cluster {
                    pixel_component[nidx] = comp;
                    queue.push(nidx);
                }
            }
        }
    }

    // Adjacency counts from horizontal and vertical pixel pairs. Diagonal
    // touch alone is not treated as a merge neighbor.
    let mut adjacency = vec![HashMap::new(); area.len()];
    for y in 0..h {
        for x in 0..w {
            let a = pixel_component[y * w + x];
            if x + 1 < w {
                let b = pixel_component[y * w + x + 1];
                if a != b {
                    *adjacency[a].entry(b).or_insert(0) += 1;
                    *adjacency[b].entry(a).or_insert(0) += 1;
                }
            }
            if y + 1 < h {
                let b = pixel_component[(y + 1) * w + x];
                if a != b {
                    *adjacency[a].entry(b).or_insert(0) += 1;
                    *adjacency[b].entry(a).or_insert(0) += 1;
                }
            }
        }
    }

    let parent = (0..area.len()).collect();
    Components {
        pixel_component,
        parent,
        area,
        cluster,
        adjacency,
    }
}

fn neighbors(
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    neighborhood: Neighborhood,
) -> impl Iterator<Item = (usize, usize)> {
    const FOUR: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const EIGHT: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    let offsets: &'static [(i64, i64)] = match neighborhood {
        Neighborhood::Four => &FOUR,
        Neighborhood::Eight => &EIGHT,
    };
    offsets.iter().filter_map(move |(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    })
}

/// Absorb sub-threshold components into their most common neighbor,
/// always taking the currently smallest offender first.
fn merge_small_components(components: &mut Components, min_area: u32) {
    loop {
        let candidate = (0..components.parent.len())
            .filter(|&i| components.parent[i] == i)
            .filter(|&i| components.area[i] < min_area)
            .filter(|&i| !components.adjacency[i].is_empty())
            .min_by_key(|&i| (components.area[i], i));

        let Some(small) = candidate else { break };

        // Most shared boundary wins, lower component id on ties.
        let target = components.adjacency[small]
            .iter()
            .map(|(&n, &count)| (count, std::cmp::Reverse(n)))
            .max()
            .map(|(_, std::cmp::Reverse(n))| n);
        let Some(target) = target else { break };

        components.parent[small] = target;
        components.area[target] += components.area[small];

        let edges: Vec<(usize, u64)> = components.adjacency[small].drain().collect();
        for (neighbor, count) in edges {
            components.adjacency[neighbor].remove(&small);
            if neighbor != target {
                *components.adjacency[target].entry(neighbor).or_insert(0) += count;
                *components.adjacency[neighbor].entry(target).or_insert(0) += count;
            }
        }
    }
}
