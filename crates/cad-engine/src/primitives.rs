//! Primitive solids built with truck's sweep API, and STEP text for them.
//!
//! truck has no built-in box/cylinder: everything is successive sweeps.
//! The STEP writers produce small but real AP203 files, which is what the
//! smoke tests and fixtures feed back into [`crate::TruckEngine`].

use std::f64::consts::PI;
use std::io;
use std::path::Path;

use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::{EuclideanSpace, Point3, Rad, Vector3};
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel, StepModels};

/// Box solid with its minimum corner at `origin`.
pub fn make_box(origin: [f64; 3], size: [f64; 3]) -> Solid {
    let v = builder::vertex(Point3::new(origin[0], origin[1], origin[2]));
    let edge = builder::tsweep(&v, Vector3::new(size[0], 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size[1], 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, size[2]))
}

/// Cylinder solid: base circle centred at the origin in the XY plane, extending along +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Option<Solid> {
    let v = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let wire = builder::rsweep(&v, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI));
    let face = builder::try_attach_plane(&[wire]).ok()?;
    Some(builder::tsweep(&face, Vector3::new(0.0, 0.0, height)))
}

fn header(organization: &str) -> StepHeaderDescriptor {
    StepHeaderDescriptor {
        organization_system: organization.to_owned(),
        ..Default::default()
    }
}

/// Serialize the outer shell of `solid` as a STEP document.
pub fn step_string(solid: &Solid, organization: &str) -> String {
    let compressed = solid.boundaries()[0].compress();
    CompleteStepDisplay::new(StepModel::from(&compressed), header(organization)).to_string()
}

/// Serialize the outer shells of several solids as one STEP document with
/// one shell entity per solid.
pub fn step_string_many(solids: &[Solid], organization: &str) -> String {
    let shells: Vec<_> = solids.iter().map(|s| s.boundaries()[0].compress()).collect();
    CompleteStepDisplay::new(StepModels::from_iter(shells.iter()), header(organization))
        .to_string()
}

/// Write `solid` to `path` as STEP.
pub fn write_step(solid: &Solid, path: &Path) -> io::Result<()> {
    std::fs::write(path, step_string(solid, "mesh-convert fixtures"))
}

/// Write `solids` to `path` as one multi-shell STEP document.
pub fn write_step_many(solids: &[Solid], path: &Path) -> io::Result<()> {
    std::fs::write(path, step_string_many(solids, "mesh-convert fixtures"))
}
