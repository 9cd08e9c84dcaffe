//! Turns dataset rows into bubbles: radius from the size column through a
//! power scale, fill from the category column through an ordinal scale, and
//! a random starting point inside the seeding rectangle.

use rand::Rng;
use tracing::{debug, warn};

use crate::config::ChartConfig;
use crate::data::{Dataset, Row};
use crate::io::{ChartError, ChartResult};
use crate::scale::{OrdinalScale, PowScale, Rgb};
use crate::simulation::{Body, Particle};

/// One drawn circle and the record it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub id: String,
    pub radius: f64,
    /// Raw value of the size column
    pub size: f64,
    pub city: String,
    pub country: String,
    pub fill: Rgb,
    pub stroke: Rgb,
    pub particle: Particle,
}

impl Body for Bubble {
    fn particle(&self) -> &Particle {
        &self.particle
    }

    fn particle_mut(&mut self) -> &mut Particle {
        &mut self.particle
    }
}

/// A category shown in the legend
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub category: String,
    pub color: Rgb,
    /// Number of bubbles in this category
    pub count: usize,
}

/// Output of [`create_bubbles`]
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    /// Bubbles ordered largest first
    pub bubbles: Vec<Bubble>,
    /// Categories present in the data, in colour-scale order
    pub legend: Vec<LegendEntry>,
    /// Rows dropped because their size column was absent or not a number
    pub skipped: usize,
}

/// Parse the configured palette into colours
pub fn parse_palette(palette: &[String]) -> ChartResult<Vec<Rgb>> {
    palette
        .iter()
        .map(|hex| {
            Rgb::parse_hex(hex)
                .ok_or_else(|| ChartError::Config(format!("invalid palette colour '{hex}'")))
        })
        .collect()
}

/// Numeric size of a row; a blank cell counts as zero, a missing column or
/// non-numeric text as no size at all
fn parse_size(row: &Row, column: &str) -> Option<f64> {
    let raw = row.get(column)?.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    let value: f64 = raw.parse().ok()?;
    value.is_finite().then_some(value)
}

fn text(row: &Row, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

/// Map every usable row to a bubble.
///
/// Initial positions are drawn from `rng` in row order; bubbles are then
/// sorted by descending size (ties keep row order) so the smallest are
/// drawn last, and colours are assigned in that drawing order.
pub fn create_bubbles<R: Rng>(
    dataset: &Dataset,
    config: &ChartConfig,
    rng: &mut R,
) -> ChartResult<Mapping> {
    let columns = &config.columns;
    let palette = parse_palette(&config.colors.palette)?;

    let mut parsed = Vec::with_capacity(dataset.len());
    let mut skipped = 0;
    for (index, row) in dataset.rows.iter().enumerate() {
        match parse_size(row, &columns.size) {
            Some(size) => parsed.push((index, row, size)),
            None => {
                warn!(
                    row = index,
                    column = %columns.size,
                    value = ?row.get(&columns.size),
                    "skipping row with a non-numeric size"
                );
                skipped += 1;
            }
        }
    }

    let Some(max_size) = parsed.iter().map(|(_, _, size)| *size).reduce(f64::max) else {
        return Ok(Mapping {
            skipped,
            ..Mapping::default()
        });
    };

    let radius = &config.radius;
    let scale = PowScale::new(radius.exponent)
        .domain(0.0, max_size)
        .range(radius.range_min, radius.range_max);

    let placeholder = Rgb::new(0.0, 0.0, 0.0);
    let mut bubbles: Vec<Bubble> = parsed
        .into_iter()
        .map(|(index, row, size)| {
            let id = row
                .get(&columns.id)
                .filter(|id| !id.is_empty())
                .cloned()
                .unwrap_or_else(|| index.to_string());
            let x = rng.r#gen::<f64>() * config.seeding.spread_x;
            let y = rng.r#gen::<f64>() * config.seeding.spread_y;

            Bubble {
                id,
                radius: scale.scale(size / radius.divisor),
                size,
                city: text(row, &columns.city),
                country: text(row, &columns.country),
                fill: placeholder,
                stroke: placeholder,
                particle: Particle::at(x, y),
            }
        })
        .collect();

    bubbles.sort_by(|a, b| b.size.total_cmp(&a.size));

    let mut colors =
        OrdinalScale::new(palette).with_domain(config.colors.domain.iter().cloned());
    for bubble in &mut bubbles {
        bubble.fill = colors
            .get(&bubble.country)
            .ok_or_else(|| ChartError::Config("colour palette is empty".to_string()))?;
        bubble.stroke = bubble.fill.darker(1.0);
    }

    let legend = colors
        .domain()
        .iter()
        .filter_map(|category| {
            let count = bubbles.iter().filter(|b| &b.country == category).count();
            let color = bubbles.iter().find(|b| &b.country == category)?.fill;
            Some(LegendEntry {
                category: category.clone(),
                color,
                count,
            })
        })
        .collect();

    debug!(
        bubbles = bubbles.len(),
        skipped,
        max_size,
        "mapped rows to bubbles"
    );
    Ok(Mapping {
        bubbles,
        legend,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CsvReader;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dataset(csv: &str) -> Dataset {
        CsvReader::new().read_from(csv.as_bytes()).unwrap()
    }

    fn map(csv: &str) -> Mapping {
        let mut rng = StdRng::seed_from_u64(1);
        create_bubbles(&dataset(csv), &ChartConfig::default(), &mut rng).unwrap()
    }

    const AIRPORTS: &str = "id,flights,city,country\n\
                            JFK,400,New York,US\n\
                            LHR,1600,London,UK\n\
                            PEK,900,Beijing,China\n\
                            CDG,100,Paris,France\n";

    #[test]
    fn sorts_largest_first() {
        let mapping = map(AIRPORTS);
        let ids: Vec<&str> = mapping.bubbles.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["LHR", "PEK", "JFK", "CDG"]);
    }

    #[test]
    fn ties_keep_row_order() {
        let mapping = map("id,flights\na,5\nb,7\nc,5\nd,5\n");
        let ids: Vec<&str> = mapping.bubbles.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn radius_follows_sqrt_scale_of_divided_size() {
        let mapping = map(AIRPORTS);
        let lhr = &mapping.bubbles[0];
        // 1600 / 16 = 100; sqrt(100) / sqrt(1600) = 0.25 -> 2 + 83 * 0.25
        assert!((lhr.radius - 22.75).abs() < 1e-9);
        assert!(mapping.bubbles.windows(2).all(|w| w[0].radius >= w[1].radius));
    }

    #[test]
    fn colours_follow_category_domain() {
        let mapping = map(AIRPORTS);
        let by_id = |id: &str| mapping.bubbles.iter().find(|b| b.id == id).unwrap();

        assert_eq!(by_id("JFK").fill.to_hex(), "#1f77b4");
        assert_eq!(by_id("LHR").fill.to_hex(), "#ff7f0e");
        assert_eq!(by_id("PEK").fill.to_hex(), "#2ca02c");
        assert_eq!(by_id("CDG").fill.to_hex(), "#d62728");
        assert_eq!(by_id("JFK").stroke.to_hex(), "#16537e");
    }

    #[test]
    fn unknown_categories_extend_palette_in_draw_order() {
        let mapping = map("id,flights,country\nsmall,1,Japan\nbig,9,Brazil\n");
        // Eight known categories occupy slots 0-7; Brazil is drawn first
        assert_eq!(mapping.bubbles[0].fill.to_hex(), "#bcbd22");
        assert_eq!(mapping.bubbles[1].fill.to_hex(), "#17becf");
    }

    #[test]
    fn initial_positions_stay_in_seeding_rectangle() {
        let mapping = map(AIRPORTS);
        for b in &mapping.bubbles {
            assert!((0.0..900.0).contains(&b.particle.x));
            assert!((0.0..800.0).contains(&b.particle.y));
            assert_eq!((b.particle.vx, b.particle.vy), (0.0, 0.0));
        }
    }

    #[test]
    fn same_seed_same_positions() {
        let first = map(AIRPORTS);
        let second = map(AIRPORTS);
        assert_eq!(first.bubbles, second.bubbles);
    }

    #[test]
    fn unparseable_sizes_are_skipped() {
        let mapping = map("id,flights\na,12\nb,lots\nc,\nd,NaN\ne, 3 \n");
        let ids: Vec<&str> = mapping.bubbles.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e", "c"]);
        assert_eq!(mapping.skipped, 2);
    }

    #[test]
    fn blank_size_draws_smallest_bubble() {
        let mapping = map("id,flights\na,1600\nb,\nc,  \n");
        assert_eq!(mapping.bubbles.len(), 3);
        assert_eq!(mapping.skipped, 0);
        for b in &mapping.bubbles[1..] {
            assert_eq!(b.size, 0.0);
            assert_eq!(b.radius, 2.0);
        }
    }

    #[test]
    fn missing_size_column_is_skipped() {
        let mapping = map("id,city\na,London\n");
        assert!(mapping.bubbles.is_empty());
        assert_eq!(mapping.skipped, 1);
    }

    #[test]
    fn missing_id_falls_back_to_row_index() {
        let mapping = map("id,flights\n,10\nnamed,5\n");
        assert_eq!(mapping.bubbles[0].id, "0");
        assert_eq!(mapping.bubbles[1].id, "named");
    }

    #[test]
    fn empty_dataset_maps_to_nothing() {
        let mapping = map("id,flights\n");
        assert!(mapping.bubbles.is_empty());
        assert!(mapping.legend.is_empty());
        assert_eq!(mapping.skipped, 0);
    }

    #[test]
    fn all_zero_sizes_use_range_midpoint() {
        let mapping = map("id,flights\na,0\nb,0\n");
        for b in &mapping.bubbles {
            assert_eq!(b.radius, 43.5);
        }
    }

    #[test]
    fn legend_counts_present_categories() {
        let mapping = map("id,flights,country\na,1,UK\nb,2,US\nc,3,UK\nd,4,Peru\n");
        let legend: Vec<(&str, usize)> = mapping
            .legend
            .iter()
            .map(|e| (e.category.as_str(), e.count))
            .collect();
        assert_eq!(legend, vec![("US", 1), ("UK", 2), ("Peru", 1)]);
    }

    #[test]
    fn custom_columns_are_honoured() {
        let mut config = ChartConfig::default();
        config.columns.id = "code".to_string();
        config.columns.size = "passengers".to_string();
        config.columns.country = "region".to_string();

        let data = dataset("code,passengers,region\nA,10,Others\n");
        let mut rng = StdRng::seed_from_u64(1);
        let mapping = create_bubbles(&data, &config, &mut rng).unwrap();

        assert_eq!(mapping.bubbles[0].id, "A");
        assert_eq!(mapping.bubbles[0].country, "Others");
        assert_eq!(mapping.bubbles[0].fill.to_hex(), "#7f7f7f");
    }

    #[test]
    fn invalid_palette_is_a_config_error() {
        let mut config = ChartConfig::default();
        config.colors.palette = vec!["blue".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        let err = create_bubbles(&dataset(AIRPORTS), &config, &mut rng).unwrap_err();
        assert!(matches!(err, ChartError::Config(_)));
    }

    #[test]
    fn non_ascii_palette_entry_is_a_config_error() {
        let mut config = ChartConfig::default();
        config.colors.palette = vec!["#a\u{e9}aaa".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        let err = create_bubbles(&dataset(AIRPORTS), &config, &mut rng).unwrap_err();
        assert!(matches!(err, ChartError::Config(msg) if msg.contains("invalid palette colour")));
    }
}
