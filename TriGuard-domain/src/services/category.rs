use crate::entities::blood_pressure::BloodPressureCategory;

const CRISIS_SYSTOLIC: u16 = 180;
const CRISIS_DIASTOLIC: u16 = 120;
const STAGE2_SYSTOLIC: u16 = 140;
const STAGE2_DIASTOLIC: u16 = 90;
const STAGE1_SYSTOLIC: u16 = 130;
const STAGE1_DIASTOLIC: u16 = 80;
const ELEVATED_SYSTOLIC: u16 = 120;

/// Categorize a reading. The most severe matching band wins.
pub fn categorize_blood_pressure(systolic: u16, diastolic: u16) -> BloodPressureCategory {
    if systolic >= CRISIS_SYSTOLIC || diastolic >= CRISIS_DIASTOLIC {
        BloodPressureCategory::HypertensiveCrisis
    } else if systolic >= STAGE2_SYSTOLIC || diastolic >= STAGE2_DIASTOLIC {
        BloodPressureCategory::Hypertension2
    } else if systolic >= STAGE1_SYSTOLIC || diastolic >= STAGE1_DIASTOLIC {
        BloodPressureCategory::Hypertension1
    } else if systolic >= ELEVATED_SYSTOLIC {
        BloodPressureCategory::Elevated
    } else {
        BloodPressureCategory::Normal
    }
}

/// Whether a reading needs immediate attention
pub fn is_hypertensive_crisis(systolic: u16, diastolic: u16) -> bool {
    categorize_blood_pressure(systolic, diastolic) == BloodPressureCategory::HypertensiveCrisis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_bands() {
        let cases = [
            (110, 75, BloodPressureCategory::Normal),
            (119, 79, BloodPressureCategory::Normal),
            (125, 75, BloodPressureCategory::Elevated),
            (135, 75, BloodPressureCategory::Hypertension1),
            (120, 85, BloodPressureCategory::Hypertension1),
            (145, 75, BloodPressureCategory::Hypertension2),
            (120, 95, BloodPressureCategory::Hypertension2),
            (185, 75, BloodPressureCategory::HypertensiveCrisis),
            (120, 125, BloodPressureCategory::HypertensiveCrisis),
        ];

        for (systolic, diastolic, expected) in cases {
            assert_eq!(
                categorize_blood_pressure(systolic, diastolic),
                expected,
                "{}/{}",
                systolic,
                diastolic
            );
        }
    }

    #[test]
    fn test_crisis_flag() {
        assert!(is_hypertensive_crisis(180, 100));
        assert!(!is_hypertensive_crisis(179, 119));
    }
}
