//! Format drivers and the registry that picks one for a file.
//!
//! A [`Driver`] turns a file into a [`Mesh`] or attaches dataset groups to
//! an existing mesh. The [`DriverManager`] owns the registered drivers and
//! chooses the first enabled one that accepts a path, unless the URI names
//! a driver explicitly (`DRIVER:"path"`).

use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::core::Diagnostics;
use crate::mesh::Mesh;
use crate::util::{Error, Result};

/// What a driver is able to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub read_mesh: bool,
    pub read_datasets: bool,
}

impl Capabilities {
    pub const MESH: Self = Self {
        read_mesh: true,
        read_datasets: false,
    };
    pub const DATASETS: Self = Self {
        read_mesh: false,
        read_datasets: true,
    };
    pub const ALL: Self = Self {
        read_mesh: true,
        read_datasets: true,
    };
}

/// A reader for one file format.
///
/// Drivers record recoverable problems (skipped elements, duplicate nodes)
/// in the [`Diagnostics`] they are handed and still return a result.
pub trait Driver: Send + Sync {
    /// Short unique name, used in `DRIVER:"path"` URIs.
    fn name(&self) -> &str;

    /// Human readable name.
    fn long_name(&self) -> &str {
        self.name()
    }

    /// File dialog filter, e.g. `*.2dm`.
    fn filters(&self) -> &str {
        ""
    }

    fn capabilities(&self) -> Capabilities;

    /// Cheap check whether `path` looks like a mesh this driver reads.
    fn can_read_mesh(&self, _path: &Path) -> bool {
        false
    }

    /// Cheap check whether `path` holds datasets this driver reads.
    fn can_read_datasets(&self, _path: &Path) -> bool {
        false
    }

    fn load_mesh(&self, path: &Path, _diagnostics: &mut Diagnostics) -> Result<Mesh> {
        Err(Error::MissingDriver(format!(
            "driver {} cannot read mesh {}",
            self.name(),
            path.display()
        )))
    }

    /// Attach the groups found in `path` to `mesh`.
    fn load_datasets(&self, path: &Path, _mesh: &mut Mesh, _diagnostics: &mut Diagnostics) -> Result<()> {
        Err(Error::MissingDriver(format!(
            "driver {} cannot read datasets {}",
            self.name(),
            path.display()
        )))
    }
}

/// A mesh URI split into its optional driver prefix and the file path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshUri<'a> {
    pub driver: Option<&'a str>,
    pub path: &'a str,
}

impl<'a> MeshUri<'a> {
    /// Parse `DRIVER:"path"` or a bare path. Windows drive letters (`C:\`)
    /// are not mistaken for a driver because the path must be quoted.
    pub fn parse(uri: &'a str) -> Self {
        if let Some((driver, rest)) = uri.split_once(":\"") {
            if !driver.is_empty() {
                let path = rest.strip_suffix('"').unwrap_or(rest);
                return Self {
                    driver: Some(driver),
                    path,
                };
            }
        }
        Self {
            driver: None,
            path: uri.trim_matches('"'),
        }
    }
}

/// Registry of drivers.
#[derive(Default)]
pub struct DriverManager {
    drivers: RwLock<Vec<Arc<dyn Driver>>>,
    disabled: RwLock<Vec<String>>,
}

impl DriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry. Starts empty; format crates register into it.
    pub fn global() -> Arc<DriverManager> {
        static GLOBAL: OnceLock<Arc<DriverManager>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(DriverManager::new())).clone()
    }

    /// Add a driver. A driver with the same name is replaced.
    pub fn register(&self, driver: Arc<dyn Driver>) {
        let mut drivers = self.drivers.write();
        tracing::debug!(driver = driver.name(), "driver registered");
        if let Some(slot) = drivers.iter_mut().find(|d| d.name() == driver.name()) {
            *slot = driver;
        } else {
            drivers.push(driver);
        }
    }

    /// Snapshot of registered drivers, in registration order.
    pub fn drivers(&self) -> Vec<Arc<dyn Driver>> {
        self.drivers.read().clone()
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.read().len()
    }

    /// Registered driver by name (case insensitive), disabled or not.
    pub fn driver(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .read()
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Replace the set of drivers that are never picked.
    pub fn set_disabled<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.disabled.write() = names.into_iter().map(Into::into).collect();
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled
            .read()
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }

    fn is_usable(&self, name: &str, excluded: &[String]) -> bool {
        !self.is_disabled(name) && !excluded.iter().any(|d| d.eq_ignore_ascii_case(name))
    }

    fn enabled(&self, excluded: &[String]) -> Vec<Arc<dyn Driver>> {
        self.drivers
            .read()
            .iter()
            .filter(|d| self.is_usable(d.name(), excluded))
            .cloned()
            .collect()
    }

    fn named(&self, name: &str, excluded: &[String]) -> Result<Arc<dyn Driver>> {
        match self.driver(name) {
            Some(d) if self.is_usable(d.name(), excluded) => Ok(d),
            _ => Err(Error::MissingDriver(name.to_string())),
        }
    }

    /// Load a mesh from `uri`, with or without a driver prefix.
    pub fn load_mesh(&self, uri: &str, diagnostics: &mut Diagnostics) -> Result<Mesh> {
        self.load_mesh_excluding(uri, &[], diagnostics)
    }

    /// Like [`load_mesh`](Self::load_mesh), also skipping the drivers named
    /// in `excluded` for this call only.
    pub fn load_mesh_excluding(
        &self,
        uri: &str,
        excluded: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<Mesh> {
        let uri = MeshUri::parse(uri);
        let path = Path::new(uri.path);
        let named = uri.driver.map(|name| self.named(name, excluded)).transpose()?;
        ensure_exists(path)?;

        let driver = match named {
            Some(driver) => driver,
            None => self
                .enabled(excluded)
                .into_iter()
                .find(|d| d.capabilities().read_mesh && d.can_read_mesh(path))
                .ok_or_else(|| Error::UnknownFormat(uri.path.to_string()))?,
        };

        tracing::debug!(driver = driver.name(), path = %path.display(), "loading mesh");
        let mesh = driver.load_mesh(path, diagnostics)?;
        if !diagnostics.is_empty() {
            tracing::info!(
                driver = driver.name(),
                warnings = diagnostics.len(),
                "mesh loaded with warnings"
            );
        }
        Ok(mesh)
    }

    /// Load mesh `uri` with the driver called `driver_name`.
    pub fn load_mesh_with(&self, driver_name: &str, path: &str, diagnostics: &mut Diagnostics) -> Result<Mesh> {
        self.load_mesh(&format!("{}:\"{}\"", driver_name, path), diagnostics)
    }

    /// Attach the dataset groups found at `path` to `mesh`.
    pub fn load_datasets(&self, mesh: &mut Mesh, path: &str, diagnostics: &mut Diagnostics) -> Result<()> {
        self.load_datasets_excluding(mesh, path, &[], diagnostics)
    }

    /// Like [`load_datasets`](Self::load_datasets), also skipping the
    /// drivers named in `excluded`. When the driver fails, groups it had
    /// already attached are removed again and `mesh` is left as it was.
    pub fn load_datasets_excluding(
        &self,
        mesh: &mut Mesh,
        path: &str,
        excluded: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let file = Path::new(path);
        ensure_exists(file)?;

        let driver = self
            .enabled(excluded)
            .into_iter()
            .find(|d| d.capabilities().read_datasets && d.can_read_datasets(file))
            .ok_or_else(|| Error::UnknownFormat(path.to_string()))?;

        let before = mesh.group_count();
        tracing::debug!(driver = driver.name(), path, "loading datasets");
        if let Err(e) = driver.load_datasets(file, mesh, diagnostics) {
            tracing::debug!(
                driver = driver.name(),
                dropped = mesh.group_count().saturating_sub(before),
                "dataset load failed, groups rolled back"
            );
            mesh.truncate_groups(before);
            return Err(e);
        }
        tracing::debug!(
            driver = driver.name(),
            groups = mesh.group_count().saturating_sub(before),
            "datasets loaded"
        );
        Ok(())
    }
}

impl std::fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.drivers.read().iter().map(|d| d.name().to_string()).collect();
        f.debug_struct("DriverManager")
            .field("drivers", &names)
            .field("disabled", &*self.disabled.read())
            .finish()
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::FileNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Warning;
    use crate::dataset::DatasetGroupBuilder;
    use crate::mesh::MemoryGeometry;

    struct Ext {
        name: &'static str,
        ext: &'static str,
    }

    impl Driver for Ext {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::MESH
        }

        fn can_read_mesh(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == self.ext)
        }

        fn load_mesh(&self, path: &Path, diagnostics: &mut Diagnostics) -> Result<Mesh> {
            diagnostics.warn(Warning::NodeNotUnique, "node 3");
            Ok(Mesh::from_memory(
                self.name,
                &path.to_string_lossy(),
                MemoryGeometry::default(),
            ))
        }
    }

    /// Attaches one group, then gives up on the rest of the file.
    struct Truncated;

    impl Driver for Truncated {
        fn name(&self) -> &str {
            "Truncated"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::DATASETS
        }

        fn can_read_datasets(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "res")
        }

        fn load_datasets(&self, _path: &Path, mesh: &mut Mesh, _diagnostics: &mut Diagnostics) -> Result<()> {
            mesh.add_group(DatasetGroupBuilder::new("Truncated", "").name("Half"));
            Err(Error::invalid("unexpected end of file"))
        }
    }

    fn manager() -> DriverManager {
        let dm = DriverManager::new();
        dm.register(Arc::new(Ext { name: "A", ext: "a" }));
        dm.register(Arc::new(Ext { name: "B", ext: "b" }));
        dm
    }

    #[test]
    fn test_parse_uri() {
        assert_eq!(
            MeshUri::parse("2DM:\"/data/mesh.2dm\""),
            MeshUri { driver: Some("2DM"), path: "/data/mesh.2dm" }
        );
        assert_eq!(
            MeshUri::parse("/data/mesh.2dm"),
            MeshUri { driver: None, path: "/data/mesh.2dm" }
        );
        assert_eq!(
            MeshUri::parse("C:\\data\\mesh.2dm"),
            MeshUri { driver: None, path: "C:\\data\\mesh.2dm" }
        );
    }

    #[test]
    fn test_register_and_lookup() {
        let dm = manager();
        assert_eq!(dm.driver_count(), 2);
        assert!(dm.driver("a").is_some());
        assert!(dm.driver("C").is_none());

        dm.register(Arc::new(Ext { name: "A", ext: "aa" }));
        assert_eq!(dm.driver_count(), 2);
    }

    #[test]
    fn test_pick_by_extension() {
        let dm = manager();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.b");
        std::fs::write(&path, "").unwrap();

        let mut diag = Diagnostics::new();
        let mesh = dm.load_mesh(&path.to_string_lossy(), &mut diag).unwrap();
        assert_eq!(mesh.driver_name(), "B");
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dm = manager();
        let dir = tempfile::tempdir().unwrap();
        let unknown = dir.path().join("m.zzz");
        std::fs::write(&unknown, "").unwrap();
        let mut diag = Diagnostics::new();

        let missing = dir.path().join("nope.a");
        assert!(matches!(
            dm.load_mesh(&missing.to_string_lossy(), &mut diag),
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(
            dm.load_mesh(&unknown.to_string_lossy(), &mut diag),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            dm.load_mesh_with("C", &unknown.to_string_lossy(), &mut diag),
            Err(Error::MissingDriver(_))
        ));

        // Named driver skips the extension check.
        let mesh = dm.load_mesh_with("A", &unknown.to_string_lossy(), &mut diag).unwrap();
        assert_eq!(mesh.driver_name(), "A");
    }

    #[test]
    fn test_disabled_driver_is_skipped() {
        let dm = manager();
        dm.set_disabled(["a"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.a");
        std::fs::write(&path, "").unwrap();
        let mut diag = Diagnostics::new();

        assert!(matches!(
            dm.load_mesh(&path.to_string_lossy(), &mut diag),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            dm.load_mesh_with("A", &path.to_string_lossy(), &mut diag),
            Err(Error::MissingDriver(_))
        ));
    }

    #[test]
    fn test_no_dataset_driver() {
        let dm = manager();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res.a");
        std::fs::write(&path, "").unwrap();
        let mut mesh = Mesh::from_memory("A", "", MemoryGeometry::default());
        let mut diag = Diagnostics::new();
        assert!(matches!(
            dm.load_datasets(&mut mesh, &path.to_string_lossy(), &mut diag),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_excluded_driver_only_for_that_call() {
        let dm = manager();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.a");
        std::fs::write(&path, "").unwrap();
        let path = path.to_string_lossy();
        let mut diag = Diagnostics::new();

        let excluded = vec!["A".to_string()];
        assert!(matches!(
            dm.load_mesh_excluding(&path, &excluded, &mut diag),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            dm.load_mesh_excluding(&format!("A:\"{}\"", path), &excluded, &mut diag),
            Err(Error::MissingDriver(_))
        ));
        assert!(!dm.is_disabled("A"));
        assert_eq!(dm.load_mesh(&path, &mut diag).unwrap().driver_name(), "A");
    }

    #[test]
    fn test_failed_dataset_load_rolls_back_groups() {
        let dm = manager();
        dm.register(Arc::new(Truncated));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depth.res");
        std::fs::write(&path, "").unwrap();

        let mut mesh = Mesh::from_memory("A", "", MemoryGeometry::default());
        mesh.add_group(DatasetGroupBuilder::new("A", "").name("Bed"));
        let mut diag = Diagnostics::new();

        let err = dm.load_datasets(&mut mesh, &path.to_string_lossy(), &mut diag).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(mesh.group_count(), 1);
        assert!(mesh.group("Half").is_none());
        assert!(mesh.group("Bed").is_some());
    }
}
