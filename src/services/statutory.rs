//! Malaysian statutory deduction schedules, employee share only.
//!
//! This module is the black-box boundary for payroll and settlement math:
//! callers hand it the month's pay components and employee particulars and
//! receive the four deduction amounts. Rates follow the published
//! schedules in simplified percentage form (the official EPF/SOCSO tables
//! bracket wages; the differences are cents and are accepted here).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// EPF employee share below age 60.
const EPF_EMPLOYEE_RATE: Decimal = dec!(0.11);
/// SOCSO employee share (Employment Injury + Invalidity).
const SOCSO_EMPLOYEE_RATE: Decimal = dec!(0.005);
/// EIS employee share.
const EIS_EMPLOYEE_RATE: Decimal = dec!(0.002);
/// SOCSO and EIS stop counting wages above this ceiling.
const SOCSO_WAGE_CEILING: Decimal = dec!(5000);
/// Employees aged 60 and above stop contributing to all three funds.
const CONTRIBUTION_AGE_LIMIT: i32 = 60;

/// Annual personal relief applied before the PCB brackets.
const PCB_PERSONAL_RELIEF: Decimal = dec!(9000);
/// Spouse relief when married and the spouse is not working.
const PCB_SPOUSE_RELIEF: Decimal = dec!(4000);
/// Relief per child.
const PCB_CHILD_RELIEF: Decimal = dec!(2000);
/// EPF contributions are tax-relieved up to this amount per year.
const PCB_EPF_RELIEF_CAP: Decimal = dec!(4000);

/// Progressive annual tax brackets, YA 2023: (upper bound, rate).
/// The final band is open-ended.
const PCB_BRACKETS: [(Decimal, Decimal); 10] = [
    (dec!(5000), dec!(0)),
    (dec!(20000), dec!(0.01)),
    (dec!(35000), dec!(0.03)),
    (dec!(50000), dec!(0.06)),
    (dec!(70000), dec!(0.11)),
    (dec!(100000), dec!(0.19)),
    (dec!(400000), dec!(0.25)),
    (dec!(600000), dec!(0.26)),
    (dec!(2000000), dec!(0.28)),
    (dec!(100000000), dec!(0.30)),
];

#[derive(Debug, Clone)]
pub struct StatutoryInput {
    pub basic: Decimal,
    pub commission: Decimal,
    pub bonus: Decimal,
    pub marital_status: Option<String>,
    pub spouse_working: bool,
    pub children_count: i32,
    /// Derived from the IC; None disables the age exemptions
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatutoryDeductions {
    pub epf_employee: Decimal,
    pub socso_employee: Decimal,
    pub eis_employee: Decimal,
    pub pcb: Decimal,
}

impl StatutoryDeductions {
    pub fn total(&self) -> Decimal {
        self.epf_employee + self.socso_employee + self.eis_employee + self.pcb
    }
}

/// Computes the employee-share deductions for one month's pay.
pub fn compute(input: &StatutoryInput) -> StatutoryDeductions {
    let wages = input.basic + input.commission + input.bonus;
    if wages <= Decimal::ZERO {
        return StatutoryDeductions::default();
    }

    let past_age_limit = input.age.is_some_and(|a| a >= CONTRIBUTION_AGE_LIMIT);

    let epf_employee = if past_age_limit {
        Decimal::ZERO
    } else {
        (wages * EPF_EMPLOYEE_RATE).round_dp(2)
    };

    let capped_wages = wages.min(SOCSO_WAGE_CEILING);
    let (socso_employee, eis_employee) = if past_age_limit {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            (capped_wages * SOCSO_EMPLOYEE_RATE).round_dp(2),
            (capped_wages * EIS_EMPLOYEE_RATE).round_dp(2),
        )
    };

    let pcb = monthly_pcb(input, wages, epf_employee);

    StatutoryDeductions {
        epf_employee,
        socso_employee,
        eis_employee,
        pcb,
    }
}

fn monthly_pcb(input: &StatutoryInput, monthly_wages: Decimal, epf_month: Decimal) -> Decimal {
    let annual_income = monthly_wages * dec!(12);
    let epf_relief = (epf_month * dec!(12)).min(PCB_EPF_RELIEF_CAP);

    let mut relief = PCB_PERSONAL_RELIEF + epf_relief;
    let married = input
        .marital_status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("married"));
    if married && !input.spouse_working {
        relief += PCB_SPOUSE_RELIEF;
    }
    relief += PCB_CHILD_RELIEF * Decimal::from(input.children_count.max(0));

    let chargeable = (annual_income - relief).max(Decimal::ZERO);

    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    for (upper, rate) in PCB_BRACKETS {
        let band = (chargeable.min(upper) - lower).max(Decimal::ZERO);
        tax += band * rate;
        if chargeable <= upper {
            break;
        }
        lower = upper;
    }

    (tax / dec!(12)).round_dp(2).max(Decimal::ZERO)
}
