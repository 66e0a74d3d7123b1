//! Technologies: flows, conversion, emissions, capacities and costs.
//!
//! OSeMOSYS gives technology data per unit of activity, with activity ratios linking the activity
//! to each fuel. INES attaches capacities and costs to the unit's flows, so the technology's
//! primary output (its first output fuel) is used to express them per unit of flow.
use super::{commit_or_log, write_value};
use crate::database::{Database, Entity, entity_name};
use crate::id::AlternativeID;
use crate::parameter::{AlternativeValues, AnnualValue, read_annual_values, union_alternatives};
use crate::units::{Capacity, FlowPerActivity, MoneyPerActivity, MoneyPerCapacity};
use crate::value::ParameterValue;
use anyhow::{Context, Result, bail, ensure};
use float_cmp::approx_eq;
use indexmap::IndexSet;
use log::warn;

const TECHNOLOGY_CLASS: &str = "REGION__TECHNOLOGY";
const FLOW_CLASS: &str = "REGION__TECHNOLOGY__FUEL";
const EMISSION_CLASS: &str = "REGION__TECHNOLOGY__EMISSION";
const YEAR_CLASS: &str = "YEAR";

/// Existing capacity is represented by a single unit of the full size
const UNITS_EXISTING: f64 = 1.0;

/// The INES conversion methods a technology can be converted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
enum ConversionMethod {
    /// Outputs only (e.g. imports)
    #[display("none")]
    None,
    /// One input and one output
    #[display("constant_efficiency")]
    ConstantEfficiency,
    /// A coefficient on each flow
    #[display("coefficients_only")]
    CoefficientsOnly,
}

/// A flow between a technology and a node
struct Flow {
    /// The target node (`region__fuel` or `region__emission`)
    node: String,
    /// The activity ratio in each alternative
    ratio: AlternativeValues<AnnualValue>,
}

/// The source data for one technology in one region
struct Technology {
    /// The target unit's name
    unit: String,
    inputs: Vec<Flow>,
    outputs: Vec<Flow>,
    emissions: Vec<Flow>,
    residual_capacity: AlternativeValues<AnnualValue>,
    capital_cost: AlternativeValues<AnnualValue>,
    fixed_cost: AlternativeValues<AnnualValue>,
    variable_cost: AlternativeValues<AnnualValue>,
    operational_life: AlternativeValues<AnnualValue>,
}

impl Technology {
    /// Read the data for a `REGION__TECHNOLOGY` entity
    fn read(source: &Database, entity: &Entity) -> Result<Self> {
        let [region, _] = entity.byname.as_slice() else {
            bail!("Invalid {TECHNOLOGY_CLASS} entity {}", entity.name);
        };

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for flow in source.entities(FLOW_CLASS) {
            if !flow.byname.starts_with(&entity.byname) {
                continue;
            }
            let Some(fuel) = flow.byname.last() else {
                continue;
            };
            let node = entity_name(&[region.clone(), fuel.clone()]);
            for (parameter, flows) in [
                ("InputActivityRatio", &mut inputs),
                ("OutputActivityRatio", &mut outputs),
            ] {
                let ratio = read_annual_values(source, FLOW_CLASS, &flow.byname, parameter)?;
                if !ratio.is_empty() {
                    flows.push(Flow {
                        node: node.clone(),
                        ratio,
                    });
                }
            }
        }

        let mut emissions = Vec::new();
        for flow in source.entities(EMISSION_CLASS) {
            if !flow.byname.starts_with(&entity.byname) {
                continue;
            }
            let Some(emission) = flow.byname.last() else {
                continue;
            };
            let ratio =
                read_annual_values(source, EMISSION_CLASS, &flow.byname, "EmissionActivityRatio")?;
            if !ratio.is_empty() {
                emissions.push(Flow {
                    node: entity_name(&[region.clone(), emission.clone()]),
                    ratio,
                });
            }
        }

        let read =
            |parameter| read_annual_values(source, TECHNOLOGY_CLASS, &entity.byname, parameter);
        Ok(Self {
            unit: entity.name.clone(),
            inputs,
            outputs,
            emissions,
            residual_capacity: read("ResidualCapacity")?,
            capital_cost: read("CapitalCost")?,
            fixed_cost: read("FixedCost")?,
            variable_cost: read("VariableCost")?,
            operational_life: read("OperationalLife")?,
        })
    }

    /// Every alternative in which any of the technology's data is defined
    fn alternatives(&self) -> IndexSet<AlternativeID> {
        let flows = self
            .inputs
            .iter()
            .chain(&self.outputs)
            .chain(&self.emissions)
            .map(|flow| &flow.ratio);
        union_alternatives(flows.chain([
            &self.residual_capacity,
            &self.capital_cost,
            &self.fixed_cost,
            &self.variable_cost,
            &self.operational_life,
        ]))
    }

    /// How the unit converts its inputs into outputs
    fn conversion_method(&self) -> ConversionMethod {
        match (self.inputs.len(), self.outputs.len()) {
            (0, _) => ConversionMethod::None,
            (1, 1) => ConversionMethod::ConstantEfficiency,
            _ => ConversionMethod::CoefficientsOnly,
        }
    }
}

/// Whether a value is missing or zero in every year
fn is_zero(value: Option<&AnnualValue>) -> bool {
    value.is_none_or(AnnualValue::all_zero)
}

/// Convert every technology in the source into a unit with flows, capacities and costs
pub fn process_capacities(
    source: &Database,
    target: &mut Database,
    default_alternative: &str,
) -> Result<()> {
    let years: Vec<_> = source
        .entities(YEAR_CLASS)
        .iter()
        .map(|entity| entity.name.clone())
        .collect();

    for entity in source.entities(TECHNOLOGY_CLASS) {
        let technology = Technology::read(source, entity)?;
        convert_technology(target, &technology, &years, default_alternative)?;
    }

    commit_or_log(target, "Added capacities and costs");
    Ok(())
}

/// Add the unit's flow entities, creating missing nodes
fn add_flow_entities(
    target: &mut Database,
    technology: &Technology,
    default_alternative: &str,
) -> Result<()> {
    let unit = &technology.unit;
    target.ensure_entity("unit", &[unit])?;
    for flow in &technology.inputs {
        target.ensure_entity("node", &[&flow.node])?;
        target.ensure_entity("node__to_unit", &[&flow.node, unit])?;
    }
    for flow in &technology.outputs {
        target.ensure_entity("node", &[&flow.node])?;
        target.ensure_entity("unit__to_node", &[unit, &flow.node])?;
    }
    for flow in &technology.emissions {
        if target.ensure_entity("node", &[&flow.node])? {
            write_value(
                target,
                "node",
                &[flow.node.clone()],
                "node_type",
                default_alternative,
                "commodity".into(),
            );
        }
        target.ensure_entity("unit__to_node", &[unit, &flow.node])?;
    }

    Ok(())
}

fn convert_technology(
    target: &mut Database,
    technology: &Technology,
    years: &[String],
    default_alternative: &str,
) -> Result<()> {
    let unit = &technology.unit;
    add_flow_entities(target, technology, default_alternative)
        .with_context(|| format!("Could not add the flows of unit {unit}"))?;

    let Some(primary_output) = technology.outputs.first() else {
        warn!("Unit {unit} has no outputs, so its capacity and costs are not converted");
        return Ok(());
    };

    let unit_byname = [unit.clone()];
    write_value(
        target,
        "unit",
        &unit_byname,
        "conversion_method",
        default_alternative,
        ParameterValue::Str(technology.conversion_method().to_string()),
    );

    let mut alternatives = technology.alternatives();
    if alternatives.is_empty() {
        alternatives.insert(AlternativeID::new(default_alternative));
    }

    for alternative in &alternatives {
        let alternative = alternative.as_str();
        let Some(output_ratio) = primary_output.ratio.resolve(alternative, default_alternative)
        else {
            continue;
        };
        ensure!(
            output_ratio.values().all(|ratio| !approx_eq!(f64, ratio, 0.0)),
            "Output activity ratio of unit {unit} is zero"
        );

        let writer = UnitWriter {
            technology,
            primary_output,
            output_ratio,
            alternative,
            default_alternative,
        };
        writer.write_conversion(target)?;
        writer.write_emissions(target)?;
        writer.write_capacity_and_costs(target, years)?;
    }

    Ok(())
}

/// Writes a unit's data for one alternative
struct UnitWriter<'a> {
    technology: &'a Technology,
    primary_output: &'a Flow,
    output_ratio: &'a AnnualValue,
    alternative: &'a str,
    default_alternative: &'a str,
}

impl UnitWriter<'_> {
    fn resolve<'b>(&self, values: &'b AlternativeValues<AnnualValue>) -> Option<&'b AnnualValue> {
        values.resolve(self.alternative, self.default_alternative)
    }

    fn write(
        &self,
        target: &mut Database,
        class: &str,
        byname: &[String],
        parameter: &str,
        value: ParameterValue,
    ) {
        write_value(target, class, byname, parameter, self.alternative, value);
    }

    /// A per-activity value expressed per unit of the primary output flow
    fn per_output_flow(&self, value: &AnnualValue) -> Result<AnnualValue> {
        value.zip_with(self.output_ratio, |cost, ratio| {
            (MoneyPerActivity(cost) / FlowPerActivity(ratio)).value()
        })
    }

    /// A per-capacity value expressed per unit of the primary output flow's capacity
    fn per_output_capacity(&self, value: &AnnualValue) -> Result<AnnualValue> {
        value.zip_with(self.output_ratio, |cost, ratio| {
            (MoneyPerCapacity(cost) / FlowPerActivity(ratio)).value()
        })
    }

    fn output_flow(&self) -> [String; 2] {
        [self.technology.unit.clone(), self.primary_output.node.clone()]
    }

    fn write_conversion(&self, target: &mut Database) -> Result<()> {
        let technology = self.technology;
        let unit = [technology.unit.clone()];
        match technology.conversion_method() {
            ConversionMethod::ConstantEfficiency => {
                let Some(input_ratio) = self.resolve(&technology.inputs[0].ratio) else {
                    return Ok(());
                };
                ensure!(
                    input_ratio.values().all(|ratio| !approx_eq!(f64, ratio, 0.0)),
                    "Input activity ratio of unit {} is zero",
                    technology.unit
                );
                let efficiency = self.output_ratio.zip_with(input_ratio, |output, input| {
                    f64::from(FlowPerActivity(output) / FlowPerActivity(input))
                })?;
                self.write(target, "unit", &unit, "efficiency", efficiency.to_value());
            }
            ConversionMethod::CoefficientsOnly => {
                for flow in &technology.inputs {
                    if let Some(ratio) = self.resolve(&flow.ratio) {
                        let byname = [flow.node.clone(), technology.unit.clone()];
                        self.write(
                            target,
                            "node__to_unit",
                            &byname,
                            "conversion_coefficient",
                            ratio.to_value(),
                        );
                    }
                }
                for flow in &technology.outputs {
                    if let Some(ratio) = self.resolve(&flow.ratio) {
                        let byname = [technology.unit.clone(), flow.node.clone()];
                        self.write(
                            target,
                            "unit__to_node",
                            &byname,
                            "conversion_coefficient",
                            ratio.to_value(),
                        );
                    }
                }
            }
            ConversionMethod::None => {}
        }

        Ok(())
    }

    fn write_emissions(&self, target: &mut Database) -> Result<()> {
        for flow in &self.technology.emissions {
            let Some(ratio) = self.resolve(&flow.ratio) else {
                continue;
            };
            let coefficient = ratio.zip_with(self.output_ratio, |emission, output| {
                f64::from(FlowPerActivity(emission) / FlowPerActivity(output))
            })?;
            let byname = [self.technology.unit.clone(), flow.node.clone()];
            self.write(
                target,
                "unit__to_node",
                &byname,
                "conversion_coefficient",
                coefficient.to_value(),
            );
        }

        Ok(())
    }

    fn write_capacity_and_costs(&self, target: &mut Database, years: &[String]) -> Result<()> {
        let technology = self.technology;
        let unit_name = &technology.unit;
        let unit = [unit_name.clone()];

        let residual_capacity = self.resolve(&technology.residual_capacity);
        if let Some(residual_capacity) = residual_capacity {
            ensure!(
                residual_capacity.is_constant(),
                "Residual capacity of unit {unit_name} varies across years, which is not supported"
            );
        }
        let residual_capacity = residual_capacity
            .and_then(AnnualValue::first)
            .unwrap_or(0.0);

        let capital_cost = self.resolve(&technology.capital_cost);
        if let Some(capital_cost) = capital_cost {
            capital_cost.check_complete(years).with_context(|| {
                format!(
                    "Capital cost of unit {unit_name} in alternative {} is incomplete",
                    self.alternative
                )
            })?;
        }
        let fixed_cost = self.resolve(&technology.fixed_cost);
        let variable_cost = self.resolve(&technology.variable_cost);

        if let Some(lifetime) = self.resolve(&technology.operational_life) {
            self.write(target, "unit", &unit, "lifetime", lifetime.to_value());
        }

        // Without capacity or fixed costs the unit can run as much as needed, so its variable
        // cost is the price of the output commodity
        if approx_eq!(f64, residual_capacity, 0.0) && is_zero(capital_cost) && is_zero(fixed_cost) {
            self.write(target, "unit", &unit, "investment_method", "not_allowed".into());
            if let Some(variable_cost) = variable_cost {
                let penalty = self.per_output_flow(variable_cost)?;
                let node = [self.primary_output.node.clone()];
                self.write(target, "node", &node, "penalty_upward", penalty.to_value());
            }
            return Ok(());
        }

        let output_flow = self.output_flow();
        let mut has_capacity = false;
        if residual_capacity > 0.0 {
            has_capacity = true;
            self.write(target, "unit", &unit, "units_existing", UNITS_EXISTING.into());
            let capacity = self.output_ratio.map(|ratio| {
                (Capacity(residual_capacity) * FlowPerActivity(ratio)).value() / UNITS_EXISTING
            });
            self.write(
                target,
                "unit__to_node",
                &output_flow,
                "capacity",
                capacity.to_value(),
            );
        }

        match capital_cost {
            Some(capital_cost) if !capital_cost.all_zero() => {
                has_capacity = true;
                self.write(target, "unit", &unit, "investment_method", "no_limits".into());
                let investment_cost = self.per_output_capacity(capital_cost)?;
                self.write(
                    target,
                    "unit__to_node",
                    &output_flow,
                    "investment_cost",
                    investment_cost.to_value(),
                );
            }
            _ => self.write(target, "unit", &unit, "investment_method", "not_allowed".into()),
        }

        if let Some(fixed_cost) = fixed_cost.filter(|cost| !cost.all_zero()) {
            let fixed_cost = self.per_output_capacity(fixed_cost)?;
            self.write(
                target,
                "unit__to_node",
                &output_flow,
                "fixed_cost",
                fixed_cost.to_value(),
            );
        }
        if let Some(variable_cost) = variable_cost {
            let variable_cost = self.per_output_flow(variable_cost)?;
            self.write(
                target,
                "unit__to_node",
                &output_flow,
                "other_operational_cost",
                variable_cost.to_value(),
            );
        }

        if !has_capacity {
            warn!(
                "Unit {unit_name} has neither existing capacity nor an investment cost in \
                 alternative {}",
                self.alternative
            );
        }

        Ok(())
    }
}
