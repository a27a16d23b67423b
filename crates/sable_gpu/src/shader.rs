//! Shader registry
//!
//! Shaders are referenced by [`ShaderId`]. Id 0 is always the built-in basic
//! shader; named shaders are validated with naga before they are accepted so a
//! bad source is reported as an error instead of a device panic.

use rustc_hash::FxHashMap;

use crate::error::{GpuError, Result};
use crate::shaders::BASIC_SHADER;

/// Name the built-in shader is registered under
pub const BASIC_SHADER_NAME: &str = "basic";

/// Handle to a registered shader program
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) u32);

impl ShaderId {
    pub const BASIC: ShaderId = ShaderId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parse and validate a WGSL module that can drive the batch pipeline
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| GpuError::Shader(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| GpuError::Shader(e.emit_to_string(source)))?;

    for entry in ["vs_main", "fs_main"] {
        if !module.entry_points.iter().any(|ep| ep.name == entry) {
            return Err(GpuError::Shader(format!("missing entry point `{entry}`")));
        }
    }
    Ok(module)
}

/// Name → id table plus the WGSL source of each shader
#[derive(Clone, Debug)]
pub struct ShaderLibrary {
    ids: FxHashMap<String, ShaderId>,
    sources: Vec<String>,
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderLibrary {
    pub fn new() -> Self {
        let mut ids = FxHashMap::default();
        ids.insert(BASIC_SHADER_NAME.to_string(), ShaderId::BASIC);
        Self {
            ids,
            sources: vec![BASIC_SHADER.to_string()],
        }
    }

    /// Validate and register `source` under `name`
    ///
    /// Registering an existing name replaces its source and keeps its id.
    pub fn register(&mut self, name: &str, source: &str) -> Result<ShaderId> {
        if name == BASIC_SHADER_NAME {
            return Err(GpuError::Shader(format!(
                "`{BASIC_SHADER_NAME}` is reserved for the built-in shader"
            )));
        }
        validate_wgsl(source)?;

        if let Some(&id) = self.ids.get(name) {
            self.sources[id.index()] = source.to_string();
            tracing::debug!("Replaced shader `{}` ({:?})", name, id);
            return Ok(id);
        }

        let id = ShaderId(self.sources.len() as u32);
        self.sources.push(source.to_string());
        self.ids.insert(name.to_string(), id);
        tracing::debug!("Registered shader `{}` ({:?})", name, id);
        Ok(id)
    }

    /// Id registered under `name`, falling back to the basic shader
    pub fn lookup(&self, name: &str) -> ShaderId {
        match self.ids.get(name) {
            Some(&id) => id,
            None => {
                tracing::warn!("Unknown shader `{}`, using `{}`", name, BASIC_SHADER_NAME);
                ShaderId::BASIC
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<ShaderId> {
        self.ids.get(name).copied()
    }

    /// WGSL source for `id`
    pub fn source(&self, id: ShaderId) -> Option<&str> {
        self.sources.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tinted_variant() -> String {
        BASIC_SHADER.replace("return in.color;", "return in.color * vec4<f32>(1.0, 0.5, 0.5, 1.0);")
    }

    #[test]
    fn basic_shader_validates() {
        assert!(validate_wgsl(BASIC_SHADER).is_ok());
        assert!(validate_wgsl(crate::shaders::PRESENT_SHADER).is_ok());
    }

    #[test]
    fn basic_is_always_present() {
        let library = ShaderLibrary::new();
        assert_eq!(library.get(BASIC_SHADER_NAME), Some(ShaderId::BASIC));
        assert_eq!(library.source(ShaderId::BASIC), Some(BASIC_SHADER));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn unknown_name_falls_back_to_basic() {
        let library = ShaderLibrary::new();
        assert_eq!(library.lookup("does-not-exist"), ShaderId::BASIC);
        assert_eq!(library.get("does-not-exist"), None);
    }

    #[test]
    fn register_assigns_stable_ids() {
        let mut library = ShaderLibrary::new();
        let id = library.register("tinted", &tinted_variant()).unwrap();
        assert_ne!(id, ShaderId::BASIC);
        assert_eq!(library.lookup("tinted"), id);

        // Same name keeps the id
        let again = library.register("tinted", BASIC_SHADER).unwrap();
        assert_eq!(again, id);
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn invalid_sources_are_rejected() {
        let mut library = ShaderLibrary::new();
        assert!(matches!(
            library.register("broken", "fn vs_main( {"),
            Err(GpuError::Shader(_))
        ));
        let no_entry = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        assert!(library.register("half", no_entry).is_err());
        assert!(library.register(BASIC_SHADER_NAME, BASIC_SHADER).is_err());
        assert_eq!(library.len(), 1);
    }
}
