use finsim_core::valuation::{build_dcf, DcfInput};
use finsim_core::FinSimError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_dcf_from_json_input() {
    let input: DcfInput = serde_json::from_str(
        r#"{
            "base_revenue": "500",
            "revenue_growth": "0.05",
            "wacc": "0.09",
            "terminal_growth": "0.02",
            "exit_multiple": "8"
        }"#,
    )
    .unwrap();
    let result = build_dcf(&input).unwrap();
    let out = &result.result;

    assert_eq!(out.projections.len(), 5);
    assert_eq!(out.projections[0].revenue, dec!(525));
    assert_eq!(out.terminal_value_exit, out.projections[4].ebitda * dec!(8));
    assert!(out.ev_gordon > Decimal::ZERO);
    assert_eq!(out.ev_average, (out.ev_gordon + out.ev_exit) / dec!(2));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["assumptions"]["wacc"], "0.09");
    assert_eq!(json["result"]["projections"][0]["year"], 1);
}

#[test]
fn test_dcf_shrinking_business_still_values() {
    let input = DcfInput {
        revenue_growth: dec!(-0.2),
        terminal_growth: dec!(-0.02),
        ..DcfInput::default()
    };
    let out = build_dcf(&input).unwrap().result;
    assert!(out.projections[4].revenue < input.base_revenue);
    // shrinking revenue releases working capital
    assert!(out.projections[0].nwc_change < Decimal::ZERO);
    assert!(out.ev_gordon > Decimal::ZERO);
}

#[test]
fn test_dcf_rejects_percentages_passed_as_whole_numbers() {
    let input = DcfInput {
        tax_rate: dec!(25),
        ..DcfInput::default()
    };
    let err = build_dcf(&input).unwrap_err();
    assert!(matches!(err, FinSimError::InvalidInput { ref field, .. } if field == "tax_rate"));
}
