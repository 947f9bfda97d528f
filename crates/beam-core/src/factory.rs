// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Factory
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Turns recipes into field model, equation of motion and integrator.
//!
//! [`FieldContext`] owns the field-map cache and the named-recipe
//! registry. It is populated once during setup; after that every method
//! takes `&self` and the context can be shared between worker threads.

use crate::dipole::{DipoleMatrixIntegrator, DipoleRodriguesIntegrator};
use crate::equation::{EquationOfMotion, GlobalField};
use crate::fringe::DipoleFringeIntegrator;
use crate::generic::{GenericIntegrator, GenericKind};
use crate::integrator::{DriftIntegrator, Integrator, IntegratorSet, IntegratorType, StepperBase};
use crate::multipole::MultipoleIntegrator;
use crate::navigator::CoordinateTransform;
use crate::query::FieldQuery;
use crate::quadrupole::QuadrupoleIntegrator;
use crate::recipe::{FieldRecipe, MapSpec};
use crate::solenoid::SolenoidIntegrator;
use crate::thin::{KickerThinIntegrator, MultipoleThinIntegrator};
use beam_field::cache::FieldMapCache;
use beam_field::composite::{LayeredField, SkewedField, TransformedField};
use beam_field::interpolated::InterpolatedField;
use beam_field::model::{min_step, FieldModel, ZeroField};
use beam_field::multipole::{
    DecapoleField, DipoleField, MultipoleField, MuonSpoilerField, OctupoleField, QuadrupoleField,
    RfSinusoidField, SextupoleField, SolenoidField,
};
use beam_field::outer::MultipoleOuterField;
use beam_field::types::{FieldClass, FieldType};
use beam_math::series::skew_angle;
use beam_types::config::{BeamConfig, StepperSettings, Units};
use beam_types::error::{BeamError, BeamResult};
use beam_types::strength::StrengthTable;
use nalgebra::{Isometry3, Vector3};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Pole-tip radius of yoke models when the recipe gives none [m].
const DEFAULT_POLE_TIP_RADIUS_M: f64 = 0.05;

/// Everything built for one recipe.
#[derive(Debug, Clone)]
pub struct FieldObjects {
    pub recipe: FieldRecipe,
    /// Field in the element frame
    pub model: Arc<dyn FieldModel>,
    pub global_field: Arc<GlobalField>,
    pub equation: Arc<EquationOfMotion>,
    pub integrator: Arc<dyn Integrator>,
    /// Step limit in host units: the recipe's own limit capped by the finest map spacing
    pub maximum_step: Option<f64>,
    pub frame: Arc<CoordinateTransform>,
}

impl FieldObjects {
    pub fn field_type(&self) -> FieldType {
        self.recipe.field_type
    }

    pub fn integrator_type(&self) -> IntegratorType {
        self.integrator.integrator_type()
    }

    /// Field at a global position and time.
    pub fn query(&self, position: &Vector3<f64>, t: f64) -> FieldQuery {
        FieldQuery::sample(self.global_field.as_ref(), self.recipe.field_type, position, t)
    }
}

#[derive(Debug)]
pub struct FieldContext {
    cache: Arc<FieldMapCache>,
    recipes: BTreeMap<String, FieldRecipe>,
    /// Thresholds in host units
    settings: StepperSettings,
    units: Units,
    integrator_set: IntegratorSet,
}

impl FieldContext {
    /// `settings` are given in metres and converted to host units here.
    pub fn new(units: Units, settings: StepperSettings, integrator_set: IntegratorSet) -> BeamResult<Self> {
        settings.validate()?;
        Ok(FieldContext {
            cache: Arc::new(FieldMapCache::new(units)),
            recipes: BTreeMap::new(),
            settings: settings.in_units(&units),
            units,
            integrator_set,
        })
    }

    pub fn from_config(config: &BeamConfig) -> BeamResult<Self> {
        config.validate()?;
        let set: IntegratorSet = config.integrator_set.parse()?;
        let mut context = FieldContext::new(config.units, config.stepper, set)?;
        for def in &config.fields {
            context.register(FieldRecipe::from_definition(def, &config.units)?)?;
        }
        info!(
            recipes = context.recipes.len(),
            integrator_set = %config.integrator_set,
            "field context ready"
        );
        Ok(context)
    }

    pub fn register(&mut self, recipe: FieldRecipe) -> BeamResult<()> {
        if recipe.name.trim().is_empty() {
            return Err(BeamError::ConfigError("field recipe without a name".to_string()));
        }
        if self.recipes.contains_key(&recipe.name) {
            return Err(BeamError::ConfigError(format!(
                "field \"{}\" is defined twice",
                recipe.name
            )));
        }
        debug!(name = %recipe.name, field_type = %recipe.field_type, "registered field recipe");
        self.recipes.insert(recipe.name.clone(), recipe);
        Ok(())
    }

    /// Recipe registered under `name`. The empty name means "no field".
    pub fn get_named_recipe(&self, name: &str) -> BeamResult<Option<&FieldRecipe>> {
        if name.is_empty() {
            return Ok(None);
        }
        self.recipes
            .get(name)
            .map(Some)
            .ok_or_else(|| BeamError::UnknownFieldName(name.to_string()))
    }

    pub fn recipes(&self) -> impl Iterator<Item = &FieldRecipe> {
        self.recipes.values()
    }

    pub fn cache(&self) -> &Arc<FieldMapCache> {
        &self.cache
    }

    pub fn settings(&self) -> &StepperSettings {
        &self.settings
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    pub fn integrator_set(&self) -> IntegratorSet {
        self.integrator_set
    }

    /// Build in a frame derived from the recipe's own `angle` and `length`.
    pub fn build(&self, recipe: &FieldRecipe) -> BeamResult<FieldObjects> {
        self.build_in(recipe, Arc::new(self.default_frame(&recipe.strength)))
    }

    pub fn build_named(&self, name: &str) -> BeamResult<Option<FieldObjects>> {
        match self.get_named_recipe(name)? {
            Some(recipe) => self.build(recipe).map(Some),
            None => Ok(None),
        }
    }

    /// Build with the element placed by `frame`.
    pub fn build_in(&self, recipe: &FieldRecipe, frame: Arc<CoordinateTransform>) -> BeamResult<FieldObjects> {
        let class = recipe.field_type.class();
        let integrator_type = recipe
            .integrator
            .unwrap_or_else(|| self.integrator_set.default_for(recipe.field_type));
        if !integrator_type.supports(class) {
            return Err(BeamError::UnsuitableIntegrator {
                integrator: integrator_type.to_string(),
                field: recipe.field_type.to_string(),
                reason: "electric fields need euler, rk4 or cashkarp".to_string(),
            });
        }

        let mut visited = Vec::new();
        let model = self.build_model(recipe, &mut visited)?;
        let global_field = Arc::new(GlobalField::new(Arc::clone(&model), Arc::clone(&frame)));
        let equation = Arc::new(EquationOfMotion::new(
            Arc::clone(&global_field) as Arc<dyn FieldModel>,
            class,
            self.units,
        ));
        let integrator = self.build_integrator(recipe, integrator_type, &equation, &frame);
        let maximum_step = min_step(recipe.maximum_step_length, model.smallest_spatial_step());

        info!(
            name = %recipe.name,
            field_type = %recipe.field_type,
            integrator = %integrator_type,
            "built field"
        );
        debug!(name = %recipe.name, maximum_step = ?maximum_step, "step limit");
        Ok(FieldObjects {
            recipe: recipe.clone(),
            model,
            global_field,
            equation,
            integrator,
            maximum_step,
            frame,
        })
    }

    /// Build a named field and sample it at a global point.
    pub fn query(&self, name: &str, position: &Vector3<f64>, t: f64) -> BeamResult<Option<FieldQuery>> {
        Ok(self.build_named(name)?.map(|objects| objects.query(position, t)))
    }

    fn default_frame(&self, strength: &StrengthTable) -> CoordinateTransform {
        let angle = strength.get("angle");
        let length = strength.get("length") * self.units.metre;
        if length <= 0.0 {
            CoordinateTransform::identity()
        } else if angle != 0.0 {
            CoordinateTransform::bent(Isometry3::identity(), angle, length)
        } else {
            CoordinateTransform::straight(Isometry3::identity(), length)
        }
    }

    /// Field model of `recipe` and its sub-fields. `visited` holds the
    /// recipes above this one in the sub-field chain.
    fn build_model(&self, recipe: &FieldRecipe, visited: &mut Vec<String>) -> BeamResult<Arc<dyn FieldModel>> {
        let subs = recipe.sub_fields();
        if subs.is_empty() {
            let primary = self.primary_model(recipe)?;
            return Ok(Arc::new(TransformedField::new(
                primary,
                recipe.transform,
                recipe.time_offset,
            )));
        }

        let mut layers = Vec::with_capacity(subs.len());
        for name in subs {
            if name == recipe.name || visited.iter().any(|v| v == name) {
                return Err(BeamError::SelfReference(recipe.name.clone()));
            }
            let sub = self
                .get_named_recipe(name)?
                .ok_or_else(|| BeamError::UnknownFieldName(name.to_string()))?;
            if !recipe.field_type.is_map() || !sub.field_type.is_map() {
                return Err(BeamError::ConfigError(format!(
                    "sub-field \"{name}\" of \"{}\": both fields must be field maps ({} and {})",
                    recipe.name, recipe.field_type, sub.field_type
                )));
            }
            layers.push(sub);
        }

        visited.push(recipe.name.clone());
        let mut model = self.build_model(&recipe.without_sub_fields(), visited)?;
        for sub in layers {
            debug!(main = %recipe.name, sub = %sub.name, "layering sub-field");
            let layer = self.build_model(sub, visited)?;
            model = Arc::new(LayeredField::new(model, layer));
        }
        visited.pop();
        Ok(model)
    }

    fn primary_model(&self, recipe: &FieldRecipe) -> BeamResult<Arc<dyn FieldModel>> {
        use FieldType as F;
        let s = recipe.strength.as_ref();
        let brho = recipe.brho;
        let units = &self.units;
        let model: Arc<dyn FieldModel> = match recipe.field_type {
            F::None | F::Zero => Arc::new(ZeroField),
            F::Dipole => Arc::new(DipoleField::from_strength(s)),
            F::Quadrupole => Arc::new(QuadrupoleField::from_strength(s, brho, units)),
            F::Sextupole => Arc::new(SextupoleField::from_strength(s, brho, units)),
            F::Octupole => Arc::new(OctupoleField::from_strength(s, brho, units)),
            F::Decapole => Arc::new(DecapoleField::from_strength(s, brho, units)),
            F::Multipole => Arc::new(MultipoleField::from_strength(s, brho, units)),
            F::Solenoid => Arc::new(SolenoidField::from_strength(s, brho)),
            F::MuonSpoiler => Arc::new(MuonSpoilerField::from_strength(s, brho)),
            F::RfSinusoid => Arc::new(RfSinusoidField::from_strength(s)),
            F::SkewQuadrupole | F::SkewSextupole | F::SkewOctupole | F::SkewDecapole => {
                let order = match recipe.field_type {
                    F::SkewQuadrupole => 2,
                    F::SkewSextupole => 3,
                    F::SkewOctupole => 4,
                    _ => 5,
                };
                Arc::new(SkewedField::new(self.normal_model(order, recipe), skew_angle(order)))
            }
            F::MagneticMap(d) => self.map_model(recipe, recipe.magnetic_map.as_ref(), d, false)?,
            F::ElectricMap(d) => self.map_model(recipe, recipe.electric_map.as_ref(), d, true)?,
            F::ElectroMagneticMap(d) => {
                let b = self.map_model(recipe, recipe.magnetic_map.as_ref(), d, false)?;
                let e = self.map_model(recipe, recipe.electric_map.as_ref(), d, true)?;
                Arc::new(LayeredField::new(b, e))
            }
            outer => {
                let order = outer.outer_order().ok_or_else(|| {
                    BeamError::UnknownFieldType(outer.to_string())
                })?;
                self.outer_model(recipe, order)
            }
        };
        Ok(model)
    }

    /// Normal closed-form model of `order` (1 = dipole).
    fn normal_model(&self, order: usize, recipe: &FieldRecipe) -> Arc<dyn FieldModel> {
        let s = recipe.strength.as_ref();
        let brho = recipe.brho;
        let units = &self.units;
        match order {
            1 => Arc::new(DipoleField::from_strength(s)),
            2 => Arc::new(QuadrupoleField::from_strength(s, brho, units)),
            3 => Arc::new(SextupoleField::from_strength(s, brho, units)),
            4 => Arc::new(OctupoleField::from_strength(s, brho, units)),
            _ => Arc::new(DecapoleField::from_strength(s, brho, units)),
        }
    }

    fn outer_model(&self, recipe: &FieldRecipe, order: usize) -> Arc<dyn FieldModel> {
        let inner = self.normal_model(order, recipe);
        let positive = if order == 1 {
            recipe.strength.get("field") < 0.0
        } else {
            recipe.strength.get(StrengthTable::normal_keys()[order - 2]) > 0.0
        };
        let pole_tip_radius = recipe
            .pole_tip_radius
            .unwrap_or(DEFAULT_POLE_TIP_RADIUS_M * self.units.metre);
        let outer = Arc::new(MultipoleOuterField::new(
            order,
            pole_tip_radius,
            inner.as_ref(),
            positive,
            self.settings.outer_spatial_limit,
        ));
        if recipe.field_type.is_skew() {
            Arc::new(SkewedField::new(outer, skew_angle(order)))
        } else {
            outer
        }
    }

    fn map_model(
        &self,
        recipe: &FieldRecipe,
        spec: Option<&MapSpec>,
        dimensions: usize,
        electric: bool,
    ) -> BeamResult<Arc<dyn FieldModel>> {
        let spec = spec.ok_or_else(|| {
            BeamError::ConfigError(format!(
                "field \"{}\" of type {} needs {} file",
                recipe.name,
                recipe.field_type,
                if electric { "an electric" } else { "a magnetic" }
            ))
        })?;
        let array = self
            .cache
            .load_checked(&spec.path, spec.format, &spec.reflections, dimensions)?;
        let interpolator = self.cache.build_interpolator(array, spec.interpolator)?;
        Ok(if electric {
            Arc::new(InterpolatedField::electric(interpolator, spec.scaling))
        } else {
            Arc::new(InterpolatedField::magnetic(interpolator, spec.scaling))
        })
    }

    fn build_integrator(
        &self,
        recipe: &FieldRecipe,
        integrator_type: IntegratorType,
        equation: &Arc<EquationOfMotion>,
        frame: &Arc<CoordinateTransform>,
    ) -> Arc<dyn Integrator> {
        let fallback: Arc<dyn Integrator> = Arc::new(GenericIntegrator::rk4(Arc::clone(equation)));
        let base = StepperBase::new(Arc::clone(frame), self.settings, self.units, fallback);
        let s = recipe.strength.as_ref();
        let brho = recipe.brho;
        let units = &self.units;
        use IntegratorType as I;
        match integrator_type {
            I::Drift => Arc::new(DriftIntegrator::new(self.units)),
            I::Solenoid => Arc::new(SolenoidIntegrator::from_strength(base, s, brho)),
            I::DipoleRodrigues => Arc::new(DipoleRodriguesIntegrator::new(base, Arc::clone(equation))),
            I::DipoleMatrix => Arc::new(DipoleMatrixIntegrator::from_strength(base, s, brho, units)),
            I::Quadrupole => Arc::new(QuadrupoleIntegrator::from_strength(base, s, brho, units)),
            I::Sextupole => Arc::new(MultipoleIntegrator::sextupole(base, s, brho, units)),
            I::Octupole => Arc::new(MultipoleIntegrator::octupole(base, s, brho, units)),
            I::Decapole => Arc::new(MultipoleIntegrator::decapole(base, s, brho, units)),
            I::MultipoleThin => Arc::new(MultipoleThinIntegrator::from_strength(base, s, brho, units)),
            I::DipoleFringe => {
                let bulk = DipoleMatrixIntegrator::from_strength(base, s, brho, units);
                Arc::new(DipoleFringeIntegrator::from_strength(bulk, s))
            }
            I::KickerThin => Arc::new(KickerThinIntegrator::from_strength(base, s, brho)),
            I::Euler => Arc::new(GenericIntegrator::new(GenericKind::Euler, Arc::clone(equation))),
            I::Rk4 => Arc::new(GenericIntegrator::new(GenericKind::Rk4, Arc::clone(equation))),
            I::CashKarp => Arc::new(GenericIntegrator::new(GenericKind::CashKarp, Arc::clone(equation))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam_types::state::{Particle, PhaseState};

    fn context() -> FieldContext {
        FieldContext::new(Units::default(), StepperSettings::default(), IntegratorSet::BdsimTwo).unwrap()
    }

    fn quad(name: &str) -> FieldRecipe {
        FieldRecipe::new(name, FieldType::Quadrupole)
            .with_brho(4.333)
            .with_strength(StrengthTable::new().with("k1", 0.34).unwrap())
    }

    #[test]
    fn test_default_integrators() {
        let ctx = context();
        let objects = ctx.build(&quad("q")).unwrap();
        assert_eq!(objects.integrator_type(), IntegratorType::Quadrupole);

        let sb = FieldRecipe::new("sb", FieldType::Dipole).with_brho(4.333).with_strength(
            StrengthTable::from_pairs([("field", 1.2), ("angle", 0.1), ("length", 0.361)]).unwrap(),
        );
        let objects = ctx.build(&sb).unwrap();
        assert_eq!(objects.integrator_type(), IntegratorType::DipoleMatrix);
        assert!(objects.frame.bend().is_some());
    }

    #[test]
    fn test_unknown_name_and_empty_name() {
        let mut ctx = context();
        ctx.register(quad("q")).unwrap();
        assert!(ctx.get_named_recipe("").unwrap().is_none());
        assert!(ctx.build_named("").unwrap().is_none());
        assert!(matches!(
            ctx.get_named_recipe("nope"),
            Err(BeamError::UnknownFieldName(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut ctx = context();
        ctx.register(quad("q")).unwrap();
        assert!(matches!(ctx.register(quad("q")), Err(BeamError::ConfigError(_))));
    }

    #[test]
    fn test_electric_field_rejects_analytic_integrator() {
        let ctx = context();
        let rf = FieldRecipe::new("rf", FieldType::RfSinusoid).with_integrator(IntegratorType::Quadrupole);
        match ctx.build(&rf) {
            Err(BeamError::UnsuitableIntegrator { integrator, field, .. }) => {
                assert_eq!(integrator, "quadrupole");
                assert_eq!(field, "rfsinusoid");
            }
            other => panic!("Unexpected result: {other:?}"),
        }
        let rf = FieldRecipe::new("rf", FieldType::RfSinusoid);
        assert_eq!(ctx.build(&rf).unwrap().integrator_type(), IntegratorType::CashKarp);
    }

    #[test]
    fn test_map_without_file_is_config_error() {
        let ctx = context();
        let map = FieldRecipe::new("m", FieldType::MagneticMap(3));
        assert!(matches!(ctx.build(&map), Err(BeamError::ConfigError(_))));
    }

    #[test]
    fn test_self_reference() {
        let mut ctx = context();
        let map = FieldRecipe::new("m", FieldType::MagneticMap(3)).with_magnetic_sub_field("m");
        ctx.register(map.clone()).unwrap();
        assert!(matches!(ctx.build(&map), Err(BeamError::SelfReference(name)) if name == "m"));
    }

    #[test]
    fn test_sub_field_of_analytic_field_rejected() {
        let mut ctx = context();
        ctx.register(quad("q")).unwrap();
        let main = quad("main").with_magnetic_sub_field("q");
        assert!(matches!(ctx.build(&main), Err(BeamError::ConfigError(_))));
    }

    #[test]
    fn test_skew_quadrupole_field() {
        let ctx = context();
        let recipe = FieldRecipe::new("sq", FieldType::SkewQuadrupole)
            .with_brho(4.333)
            .with_strength(StrengthTable::new().with("k1", 0.34).unwrap());
        let objects = ctx.build(&recipe).unwrap();
        // a skew quadrupole has a radial field on the x axis
        let q = objects.query(&Vector3::new(0.01, 0.0, 0.0), 0.0);
        let g = 4.333 * 0.34;
        assert!((q.field.magnetic.x.abs() - g * 0.01).abs() < 1e-12, "{q}");
        assert!(q.field.magnetic.y.abs() < 1e-12, "{q}");
    }

    #[test]
    fn test_outer_field_default_pole_tip() {
        let ctx = context();
        let recipe = FieldRecipe::new("yoke", FieldType::MultipoleOuterQuadrupole)
            .with_brho(4.333)
            .with_strength(StrengthTable::new().with("k1", 0.34).unwrap());
        let objects = ctx.build(&recipe).unwrap();
        let far = objects.query(&Vector3::new(0.2, 0.0, 0.0), 0.0);
        let near = objects.query(&Vector3::new(0.08, 0.0, 0.0), 0.0);
        assert!(far.field.magnetic.norm() < near.field.magnetic.norm());
    }

    #[test]
    fn test_transform_moves_field() {
        let ctx = context();
        let shifted = quad("q").with_transform(Isometry3::translation(0.01, 0.0, 0.0));
        let objects = ctx.build(&shifted).unwrap();
        let q = objects.query(&Vector3::new(0.01, 0.0, 0.0), 0.0);
        assert!(q.field.magnetic.norm() < 1e-15);
    }

    #[test]
    fn test_built_integrator_steps() {
        let ctx = context();
        let objects = ctx.build(&quad("q")).unwrap();
        let particle = Particle::proton();
        let p = particle.momentum_for_rigidity(4.333);
        let y = PhaseState::new(Vector3::new(0.001, 0.0, 0.0), Vector3::new(0.0, 0.0, p));
        let dydx = objects.equation.derivative_state(&particle, &y);
        let r = objects.integrator.step(&particle, &y, &dydx, 0.1);
        assert!(r.state.position.x < 0.001);
    }
}
