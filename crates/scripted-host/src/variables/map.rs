// Map state variables

use std::str::FromStr;
use std::sync::Arc;

use scripted_events::DoorType;
use strum::VariantNames;

use super::{Variable, VariableContext, VariableGroup, VariableKind, VariableValue};
use crate::actions::argument::{Argument, ArgumentType, OptionValue};
use crate::error::{ArgumentError, VariableError};
use crate::script::ScopedValue;

pub fn group() -> VariableGroup {
    VariableGroup::new(
        "Map",
        vec![
            Arc::new(Decontaminated),
            Arc::new(EngagedGenerators),
            Arc::new(Generators),
            Arc::new(Scp914Active),
            Arc::new(DoorState),
        ],
    )
}

pub struct Decontaminated;

impl Variable for Decontaminated {
    fn name(&self) -> &'static str {
        "DECONTAMINATED"
    }

    fn reversed_name(&self) -> Option<&'static str> {
        Some("!DECONTAMINATED")
    }

    fn description(&self) -> &'static str {
        "Whether Light Containment Zone has been decontaminated."
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Bool
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        Ok(VariableValue::Bool(ctx.world.is_decontaminated()))
    }
}

pub struct EngagedGenerators;

impl Variable for EngagedGenerators {
    fn name(&self) -> &'static str {
        "ENGAGEDGENERATORS"
    }

    fn description(&self) -> &'static str {
        "The number of engaged generators."
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Float
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let engaged = ctx.world.generators().iter().filter(|g| g.engaged).count();
        Ok(VariableValue::Float(engaged as f64))
    }
}

const GENERATOR_MODES: &[OptionValue] = &[
    OptionValue::new("ENGAGED", "Generators that have finished activating."),
    OptionValue::new("ACTIVATING", "Generators currently activating."),
    OptionValue::new("UNLOCKED", "Generators whose door is unlocked."),
    OptionValue::new("OPENED", "Generators whose door is open."),
    OptionValue::new("CLOSED", "Generators whose door is closed."),
];

pub struct Generators;

impl Variable for Generators {
    fn name(&self) -> &'static str {
        "GENERATORS"
    }

    fn description(&self) -> &'static str {
        "The number of generators in a given state."
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[Argument::required(
            "mode",
            ArgumentType::Options(GENERATOR_MODES),
            "Which generators to count.",
        )];
        ARGS
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Float
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let mode = ctx
            .args
            .option(0)
            .map_err(|err| VariableError::bad_argument(self.name(), err))?;
        let count = ctx
            .world
            .generators()
            .iter()
            .filter(|g| match mode {
                "ENGAGED" => g.engaged,
                "ACTIVATING" => g.activating,
                "UNLOCKED" => g.unlocked,
                "OPENED" => g.open,
                _ => !g.open,
            })
            .count();
        Ok(VariableValue::Float(count as f64))
    }
}

pub struct Scp914Active;

impl Variable for Scp914Active {
    fn name(&self) -> &'static str {
        "SCP914ACTIVE"
    }

    fn reversed_name(&self) -> Option<&'static str> {
        Some("!SCP914ACTIVE")
    }

    fn description(&self) -> &'static str {
        "Whether SCP-914 is currently upgrading."
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Bool
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        Ok(VariableValue::Bool(ctx.world.scp914_active()))
    }
}

pub struct DoorState;

impl Variable for DoorState {
    fn name(&self) -> &'static str {
        "DOORSTATE"
    }

    fn description(&self) -> &'static str {
        "OPEN or CLOSED for a named door."
    }

    fn long_description(&self) -> Option<&'static str> {
        Some(
            "The door may be given by name (GateA) or by the name of a variable of the \
running script that holds a door name, such as EVDOOR inside an InteractingDoor \
script: {DOORSTATE:EVDOOR}.",
        )
    }

    fn expected_arguments(&self) -> &'static [Argument] {
        const ARGS: &[Argument] = &[Argument::required(
            "door",
            ArgumentType::Text,
            "A door name, or a script variable holding one.",
        )];
        ARGS
    }

    fn needs_source(&self) -> bool {
        true
    }

    fn kind(&self) -> VariableKind {
        VariableKind::Text
    }

    fn evaluate(&self, ctx: &VariableContext<'_>) -> Result<VariableValue, VariableError> {
        let source = ctx.source(self.name())?;
        let input = ctx
            .args
            .text(0)
            .map_err(|err| VariableError::bad_argument(self.name(), err))?;

        let door = DoorType::from_str(input)
            .ok()
            .or_else(|| match source.variable(input).map(|v| &v.value) {
                Some(ScopedValue::Text(name)) => DoorType::from_str(name).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                VariableError::bad_argument(
                    self.name(),
                    ArgumentError::InvalidOption {
                        argument: "door",
                        value: input.to_string(),
                        expected: DoorType::VARIANTS.join(", "),
                    },
                )
            })?;

        let state = ctx.world.door(door).ok_or_else(|| VariableError::Evaluation {
            variable: self.name().to_string(),
            reason: format!("door {} does not exist on this map", door),
        })?;
        Ok(VariableValue::Text(
            if state.open { "OPEN" } else { "CLOSED" }.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::MessageKind;
    use crate::script::{Executor, ScriptScope};
    use crate::variables::{Resolver, VariableRegistry};
    use scripted_events::{DoorType, MemoryWorld};

    #[test]
    fn test_doorstate_reads_door_or_scoped_variable() {
        let registry = VariableRegistry::with_builtins();
        let world = MemoryWorld::new();
        world.set_door(DoorType::GateA, true);
        world.set_door(DoorType::GateB, false);

        let mut scope = ScriptScope::new("doors", Executor::Automatic);
        scope.add_variable("EVDOOR", "Door", "GateB");
        let resolver = Resolver::new(&registry, &world, Some(&scope));

        assert_eq!(resolver.replace("{DOORSTATE:gatea}").unwrap(), "OPEN");
        assert_eq!(resolver.replace("{DOORSTATE:EVDOOR}").unwrap(), "CLOSED");
        assert!(resolver.replace("{DOORSTATE:Intercom}").is_err());
        assert!(resolver.replace("{DOORSTATE:Nowhere}").is_err());
    }

    #[test]
    fn test_doorstate_needs_a_script() {
        let registry = VariableRegistry::with_builtins();
        let world = MemoryWorld::new();
        let resolver = Resolver::new(&registry, &world, None);

        let err = resolver.replace("{DOORSTATE:GateA}").unwrap_err();
        assert_eq!(err.kind(), MessageKind::MissingSource);
    }

    #[test]
    fn test_scp914_reversed() {
        let registry = VariableRegistry::with_builtins();
        let world = MemoryWorld::new();
        let resolver = Resolver::new(&registry, &world, None);
        assert_eq!(resolver.replace("{!SCP914ACTIVE}").unwrap(), "TRUE");
    }
}
