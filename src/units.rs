//! Unit types for the quantities converted between the two conventions.
//!
//! OSeMOSYS expresses technology data per unit of *activity* (e.g. cost per unit of capacity of
//! activity), whereas INES attaches it to individual commodity *flows*. Activity ratios connect
//! the two, and these types make sure they are applied in the right direction.

/// Represents a dimensionless quantity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, derive_more::Add, derive_more::Sub)]
pub struct Dimensionless(pub f64);

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl From<f64> for $name {
            fn from(val: f64) -> Self {
                Self(val)
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::from(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Capacity);
unit_struct!(FlowCapacity);

// Derived quantities
unit_struct!(FlowPerActivity);
unit_struct!(MoneyPerCapacity);
unit_struct!(MoneyPerFlowCapacity);
unit_struct!(MoneyPerActivity);
unit_struct!(MoneyPerFlow);

// Capacity of activity and the activity ratio give the capacity of the flow
impl_mul!(Capacity, FlowPerActivity, FlowCapacity);

// Costs per activity become costs per flow
impl_div!(MoneyPerCapacity, FlowPerActivity, MoneyPerFlowCapacity);
impl_div!(MoneyPerActivity, FlowPerActivity, MoneyPerFlow);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_flow_capacity() {
        let capacity = Capacity(2.0) * FlowPerActivity(0.5);
        assert_eq!(capacity, FlowCapacity(1.0));
        assert_eq!(FlowPerActivity(0.5) * Capacity(2.0), capacity);
    }

    #[test]
    fn test_cost_per_flow() {
        assert_eq!(
            MoneyPerCapacity(100.0) / FlowPerActivity(0.5),
            MoneyPerFlowCapacity(200.0)
        );
        assert_eq!(
            MoneyPerActivity(3.0) / FlowPerActivity(2.0),
            MoneyPerFlow(1.5)
        );
    }

    #[test]
    fn test_ratio() {
        let efficiency = FlowPerActivity(0.9) / FlowPerActivity(2.0);
        assert_approx_eq!(f64, f64::from(efficiency), 0.45);
        assert_eq!(Capacity(3.0) / Capacity(2.0), Dimensionless(1.5));
        assert_eq!(Capacity(3.0) / Dimensionless(2.0), Capacity(1.5));
    }
}
