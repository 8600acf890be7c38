use crate::types::{GeoCenter, SummaryError, SummaryResult};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::Dataset;
use std::path::Path;

/// EPSG code of WGS84 longitude/latitude
pub const EPSG_WGS84: u32 = 4326;

/// NSIDC Sea Ice Polar Stereographic North
pub const EPSG_NORTH_POLAR: u32 = 3413;

/// Antarctic Polar Stereographic
pub const EPSG_SOUTH_POLAR: u32 = 3031;

/// Marker of a south polar projection in a PROJ.4 string
const SOUTH_POLE_MARKER: &str = "+lat_0=-90";

/// Computes the geographic center and mean elevation of a DEM
pub trait GeoLocator {
    fn locate(&self, dem: &Path) -> SummaryResult<GeoCenter>;
}

/// Projection and raster statistics of a DEM, as read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct DemGeoInfo {
    pub proj4: String,
    /// Image center in projected coordinates
    pub projection_center: (f64, f64),
    /// Mean of band 1, nodata excluded
    pub mean_alt: f64,
}

impl DemGeoInfo {
    /// Polar stereographic EPSG code matching the hemisphere of the DEM
    pub fn polar_epsg(&self) -> u32 {
        polar_epsg(&self.proj4)
    }
}

/// Pick the polar stereographic EPSG code for a PROJ.4 string
pub fn polar_epsg(proj4: &str) -> u32 {
    if proj4.contains(SOUTH_POLE_MARKER) {
        EPSG_SOUTH_POLAR
    } else {
        EPSG_NORTH_POLAR
    }
}

/// Digital Elevation Model reader backed by GDAL
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalGeoLocator;

impl GdalGeoLocator {
    /// Read projection, center and elevation statistics of a DEM
    pub fn read_geo_info(dem_path: &Path) -> SummaryResult<DemGeoInfo> {
        log::debug!("Reading DEM geo info from: {}", dem_path.display());

        let dataset = Dataset::open(dem_path)?;
        let proj4 = dataset.spatial_ref()?.to_proj4()?;

        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        if width == 0 || height == 0 {
            return Err(SummaryError::InvalidFormat(format!(
                "DEM {} has an empty raster",
                dem_path.display()
            )));
        }

        let half_w = width as f64 / 2.0;
        let half_h = height as f64 / 2.0;
        let center_x = geo_transform[0] + geo_transform[1] * half_w + geo_transform[2] * half_h;
        let center_y = geo_transform[3] + geo_transform[4] * half_w + geo_transform[5] * half_h;

        let rasterband = dataset.rasterband(1)?;
        let nodata = rasterband.no_data_value();
        let band_data = rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let mean_alt = valid_mean(&band_data.data, nodata).ok_or_else(|| {
            SummaryError::Processing(format!(
                "DEM {} contains no valid elevation samples",
                dem_path.display()
            ))
        })?;

        log::debug!(
            "DEM size: {}x{}, center: ({:.3}, {:.3}), mean altitude: {:.3}",
            width,
            height,
            center_x,
            center_y,
            mean_alt
        );

        Ok(DemGeoInfo {
            proj4,
            projection_center: (center_x, center_y),
            mean_alt,
        })
    }
}

impl GeoLocator for GdalGeoLocator {
    fn locate(&self, dem: &Path) -> SummaryResult<GeoCenter> {
        let info = Self::read_geo_info(dem)?;
        let (center_x, center_y) = info.projection_center;
        let (lon, lat) = convert_coords(center_x, center_y, info.polar_epsg(), EPSG_WGS84)?;

        Ok(GeoCenter {
            lon,
            lat,
            mean_alt: info.mean_alt,
        })
    }
}

/// Reproject a single point between two EPSG coordinate systems.
///
/// Geographic systems use longitude/latitude order.
pub fn convert_coords(x: f64, y: f64, src_epsg: u32, dst_epsg: u32) -> SummaryResult<(f64, f64)> {
    let source_srs = SpatialRef::from_epsg(src_epsg)?;
    let target_srs = SpatialRef::from_epsg(dst_epsg)?;
    source_srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    target_srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);

    let transform = CoordTransform::new(&source_srs, &target_srs)?;
    let mut xs = [x];
    let mut ys = [y];
    let mut zs = [0.0];
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

    Ok((xs[0], ys[0]))
}

fn valid_mean(data: &[f64], nodata: Option<f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &value in data {
        if !value.is_finite() {
            continue;
        }
        if let Some(nd) = nodata {
            if value == nd {
                continue;
            }
        }
        sum += value;
        count += 1;
    }

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
