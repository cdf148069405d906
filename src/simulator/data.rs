//! Built-in patient dataset served by the simulator.

use serde_json::{json, Value};

/// Twenty patients. Several carry the kinds of broken fields the real API
/// sends: missing values, non-numeric strings, partial blood pressures, and
/// numbers with units.
pub fn sample_patients() -> Vec<Value> {
    vec![
        patient("DEMO001", "TestPatient, John", json!(45), "M", json!("120/80"), json!(98.6), "Hypertension", "Lisinopril 10mg"),
        patient("DEMO002", "AlphaTest, Jane", json!(67), "F", json!("140/90"), json!(99.2), "Type 2 Diabetes", "Metformin 500mg"),
        patient("DEMO003", "Sample, Robert", json!(34), "M", json!("150/95"), json!(101.5), "Pneumonia", "Azithromycin 250mg"),
        patient("DEMO004", "Demo, Maria", json!("fifty-three"), "F", json!("130/85"), json!(100.1), "Migraine", "Sumatriptan 50mg"),
        patient("DEMO005", "Placeholder, Lee", json!(72), "M", json!("INVALID"), json!(98.4), "COPD", "Tiotropium 18mcg"),
        patient("DEMO006", "Fixture, Ana", json!(29), "F", json!("118/76"), json!("TEMP_ERROR"), "Asthma", "Albuterol inhaler"),
        patient("DEMO007", "Mock, Samuel", Value::Null, "M", json!("145/92"), json!(99.8), "Atrial fibrillation", "Apixaban 5mg"),
        patient("DEMO008", "Stub, Priya", json!("58"), "F", json!("150/"), json!(98.9), "Osteoarthritis", "Ibuprofen 400mg"),
        patient("DEMO009", "Example, Tom", json!(81), "M", json!("162/101"), json!(102.3), "Sepsis", "Vancomycin 1g"),
        patient("DEMO010", "Sampleton, Grace", json!(40), "F", json!("/90"), json!(97.9), "Hypothyroidism", "Levothyroxine 75mcg"),
        patient("DEMO011", "Trial, Omar", json!(65), "M", json!("128/79"), json!("100.4 F"), "Influenza", "Oseltamivir 75mg"),
        patient("DEMO012", "Probe, Helen", json!(38), "F", Value::Null, json!(98.1), "Anxiety", "Sertraline 50mg"),
        patient("DEMO013", "Check, Victor", json!(55), "M", json!("135/88"), json!(""), "GERD", "Omeprazole 20mg"),
        patient("DEMO014", "Verify, Lin", json!(66), "F", json!("119/79"), json!(99.6), "Bronchitis", "Guaifenesin 600mg"),
        patient("DEMO015", "Assert, Noah", json!(""), "M", json!("121/81"), json!(98.7), "Hyperlipidemia", "Atorvastatin 20mg"),
        patient("DEMO016", "Case, Ruth", json!(90), "F", json!("N/A"), json!(101.0), "UTI", "Nitrofurantoin 100mg"),
        patient("DEMO017", "Vector, Ian", json!(23), "M", json!("110/70"), json!(98.2), "Sprained ankle", "Acetaminophen 500mg"),
        patient("DEMO018", "Matrix, Zoe", json!(47), "F", json!("139/89"), json!("invalid"), "Depression", "Fluoxetine 20mg"),
        patient("DEMO019", "Tensor, Paul", json!(70), "M", json!("180/110"), json!(103.0), "Stroke", "Alteplase"),
        patient("DEMO020", "Scalar, Ivy", json!("45.9"), "F", json!("125/82"), json!(99.0), "Eczema", "Hydrocortisone cream"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn patient(
    id: &str,
    name: &str,
    age: Value,
    gender: &str,
    blood_pressure: Value,
    temperature: Value,
    diagnosis: &str,
    medications: &str,
) -> Value {
    json!({
        "patient_id": id,
        "name": name,
        "age": age,
        "gender": gender,
        "blood_pressure": blood_pressure,
        "temperature": temperature,
        "visit_date": "2024-01-15",
        "diagnosis": diagnosis,
        "medications": medications,
    })
}
