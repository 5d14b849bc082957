// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use clinview_core::{
    Collection, FieldDescriptor, NavigationNode, NavigationTree, Record, SectionPath, Workspace,
    WorkspaceOptions,
};
use serde::Serialize;
use std::path::PathBuf;
use time::{Date, Duration, Month};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const WARDS: [&str; 5] = ["4 West", "5 East", "ICU", "Step-Down", "Oncology"];
const CLINICIANS: [&str; 8] = [
    "Dr. Okafor",
    "Dr. Lindqvist",
    "Dr. Ramos",
    "Dr. Chen",
    "Dr. Haddad",
    "Dr. Novak",
    "NP Ellis",
    "PA Moreau",
];

const ORDER_NAMES: [&str; 12] = [
    "Acetaminophen 650 mg PO q6h",
    "Ceftriaxone 1 g IV daily",
    "Heparin 5000 units SC q8h",
    "CBC with differential",
    "Basic metabolic panel",
    "Chest X-ray PA/lateral",
    "Diet: cardiac",
    "Fall precautions",
    "Physical therapy consult",
    "Insulin sliding scale",
    "Ondansetron 4 mg IV q8h PRN",
    "Telemetry monitoring",
];
const ORDER_PRIORITIES: [&str; 3] = ["Routine", "Urgent", "STAT"];

const LAB_TESTS: [(&str, &str, f64, f64); 8] = [
    ("Hemoglobin", "g/dL", 12.0, 17.5),
    ("WBC", "10^3/uL", 4.0, 11.0),
    ("Platelets", "10^3/uL", 150.0, 400.0),
    ("Sodium", "mmol/L", 135.0, 145.0),
    ("Potassium", "mmol/L", 3.5, 5.1),
    ("Creatinine", "mg/dL", 0.6, 1.3),
    ("Glucose", "mg/dL", 70.0, 99.0),
    ("Troponin I", "ng/mL", 0.0, 0.04),
];

const RADIOLOGY_STUDIES: [(&str, &str); 8] = [
    ("CT Head without contrast", "CT"),
    ("Chest X-ray PA/lateral", "XR"),
    ("CT Abdomen/Pelvis with contrast", "CT"),
    ("MRI Lumbar Spine", "MR"),
    ("Ultrasound RUQ", "US"),
    ("Venous Doppler lower extremity", "US"),
    ("CT Angiography Chest", "CT"),
    ("X-ray Left Wrist", "XR"),
];
const RADIOLOGY_IMPRESSIONS: [&str; 7] = [
    "No acute intracranial abnormality.",
    "No focal consolidation or effusion.",
    "Mild degenerative changes without acute fracture.",
    "Findings concerning for early pneumonia.",
    "No evidence of deep venous thrombosis.",
    "Small pleural effusion, unchanged.",
    "Nondisplaced distal radius fracture.",
];
const STUDY_STATUSES: [&str; 4] = ["Ordered", "Scheduled", "Preliminary", "Final"];

const NOTE_TYPES: [&str; 4] = ["Shift note", "Event note", "Education", "Handoff"];
const NOTE_TEXT: [&str; 8] = [
    "Patient resting comfortably, pain controlled",
    "Ambulated in hallway with assistance",
    "Family updated at bedside",
    "Reports nausea after lunch, antiemetic given",
    "Dressing changed, site clean and dry",
    "Refused evening medication, provider notified",
    "Tolerating diet, no distress noted",
    "Reviewed discharge teaching with patient",
];
const ASSESSMENTS: [&str; 5] = ["Braden", "Morse Fall", "Pain", "Skin", "Neuro"];
const DISPOSITIONS: [&str; 4] = ["Home", "Home with services", "Skilled nursing", "Rehab"];
const INTAKE_SOURCES: [&str; 4] = ["PO", "IV", "Tube feed", "Blood"];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub mrn: String,
    pub name: String,
    pub age: i64,
    pub sex: &'static str,
    pub ward: &'static str,
    pub bed: String,
    pub admitted: Date,
    pub attending: &'static str,
}

/// Seeded generator for demo clinical records. Same seed, same data.
#[derive(Debug, Clone)]
pub struct ClinicalFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ClinicalFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn patient(&mut self, index: usize) -> Patient {
        let ward = self.pick(&WARDS);
        Patient {
            mrn: format!("MRN-{:06}", 100_000 + self.int_range(1, 899_999)),
            name: format!("{}, {}", self.pick(&LAST_NAMES), self.pick(&FIRST_NAMES)),
            age: self.int_range(18, 97),
            sex: if self.rng.int_n(2) == 0 { "F" } else { "M" },
            ward,
            bed: format!("{}{}", 10 + index, ["A", "B"][self.rng.int_n(2)]),
            admitted: self.date_in_january(),
            attending: self.pick(&CLINICIANS),
        }
    }

    pub fn patients(&mut self, count: usize) -> Vec<Patient> {
        let mut patients = Vec::with_capacity(count);
        while patients.len() < count {
            let patient = self.patient(patients.len());
            if patients.iter().all(|existing: &Patient| existing.mrn != patient.mrn) {
                patients.push(patient);
            }
        }
        patients
    }

    pub fn order(&mut self, id: usize, patient: &Patient, status: &'static str) -> Record {
        Record::new()
            .with("id", format!("ORD-{:05}", 20_000 + id))
            .with("patient", patient.name.clone())
            .with("order", self.pick(&ORDER_NAMES))
            .with("priority", self.pick(&ORDER_PRIORITIES))
            .with("status", status)
            .with("ordered_at", self.timestamp_after(patient.admitted))
            .with("ordered_by", self.pick(&CLINICIANS))
    }

    pub fn lab_result(&mut self, id: usize, patient: &Patient) -> Record {
        let (test, unit, low, high) = LAB_TESTS[self.rng.int_n(LAB_TESTS.len())];
        let span = high - low;
        let value = low - span * 0.25 + self.rng.unit() * span * 1.5;
        let rounded = (value * 100.0).round() / 100.0;
        let flag = if rounded < low {
            "L"
        } else if rounded > high {
            "H"
        } else {
            ""
        };
        Record::new()
            .with("id", format!("LAB-{:05}", 40_000 + id))
            .with("patient", patient.name.clone())
            .with("test", test)
            .with("value", rounded)
            .with("unit", unit)
            .with("flag", flag)
            .with("collected", self.timestamp_after(patient.admitted))
    }

    pub fn radiology_study(&mut self, id: usize, patient: &Patient) -> Record {
        let (study, modality) = RADIOLOGY_STUDIES[self.rng.int_n(RADIOLOGY_STUDIES.len())];
        let status = self.pick(&STUDY_STATUSES);
        let impression = if matches!(status, "Preliminary" | "Final") {
            Some(self.pick(&RADIOLOGY_IMPRESSIONS))
        } else {
            None
        };
        Record::new()
            .with("id", format!("RAD-{:05}", 60_000 + id))
            .with("patient", patient.name.clone())
            .with("study", study)
            .with("modality", modality)
            .with("status", status)
            .with("impression", impression)
    }

    pub fn vital_signs(&mut self, id: usize, patient: &Patient) -> Record {
        let systolic = self.int_range(92, 168);
        let diastolic = self.int_range(54, 98);
        let temp = (36.0 + self.rng.unit() * 2.6) * 10.0;
        Record::new()
            .with("id", format!("VS-{:05}", 80_000 + id))
            .with("patient", patient.name.clone())
            .with("taken_at", self.timestamp_after(patient.admitted))
            .with("temp_c", temp.round() / 10.0)
            .with("heart_rate", self.int_range(52, 128))
            .with("bp", format!("{systolic}/{diastolic}"))
            .with("spo2", self.int_range(88, 100))
    }

    pub fn intake_output(&mut self, id: usize, patient: &Patient) -> Record {
        Record::new()
            .with("id", format!("IO-{:05}", 81_000 + id))
            .with("patient", patient.name.clone())
            .with("shift_start", self.timestamp_after(patient.admitted))
            .with("source", self.pick(&INTAKE_SOURCES))
            .with("intake_ml", self.int_range(100, 1800))
            .with("output_ml", self.int_range(50, 1600))
    }

    pub fn nursing_note(&mut self, id: usize, patient: &Patient) -> Record {
        Record::new()
            .with("id", format!("NN-{:05}", 90_000 + id))
            .with("patient", patient.name.clone())
            .with("written_at", self.timestamp_after(patient.admitted))
            .with("kind", self.pick(&NOTE_TYPES))
            .with("note", self.pick(&NOTE_TEXT))
    }

    pub fn assessment(&mut self, id: usize, patient: &Patient) -> Record {
        let tool = self.pick(&ASSESSMENTS);
        let score = match tool {
            "Braden" => self.int_range(9, 23),
            "Morse Fall" => self.int_range(0, 125),
            "Pain" => self.int_range(0, 10),
            _ => self.int_range(0, 4),
        };
        Record::new()
            .with("id", format!("AS-{:05}", 91_000 + id))
            .with("patient", patient.name.clone())
            .with("tool", tool)
            .with("score", score)
            .with("assessed_at", self.timestamp_after(patient.admitted))
            .with("reassess", self.rng.int_n(3) == 0)
    }

    pub fn discharge_summary(&mut self, id: usize, patient: &Patient) -> Record {
        let stay = self.int_range(1, 14);
        let discharged = patient.admitted + Duration::days(stay);
        Record::new()
            .with("id", format!("DC-{:05}", 95_000 + id))
            .with("patient", patient.name.clone())
            .with("discharged", discharged.to_string())
            .with("length_of_stay", stay)
            .with("disposition", self.pick(&DISPOSITIONS))
            .with("summary", self.pick(&NOTE_TEXT))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn date_in_january(&mut self) -> Date {
        reference_date() + Duration::days(self.int_range(0, 30))
    }

    fn timestamp_after(&mut self, start: Date) -> String {
        let date = start + Duration::days(self.int_range(0, 6));
        let hour = self.int_range(0, 23);
        let minute = self.int_range(0, 3) * 15;
        format!("{date} {hour:02}:{minute:02}")
    }
}

pub fn reference_date() -> Date {
    Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1).expect("valid calendar date")
}

pub fn demo_navigation_tree() -> NavigationTree {
    NavigationTree::new(vec![
        NavigationNode::leaf("Patients"),
        NavigationNode::branch(
            "Orders",
            vec![NavigationNode::leaf("Active"), NavigationNode::leaf("Completed")],
        ),
        NavigationNode::leaf("Labs"),
        NavigationNode::leaf("Radiology"),
        NavigationNode::branch(
            "Vitals",
            vec![
                NavigationNode::leaf("Flowsheet"),
                NavigationNode::leaf("Intake/Output"),
            ],
        ),
        NavigationNode::branch(
            "Nursing",
            vec![NavigationNode::leaf("Notes"), NavigationNode::leaf("Assessments")],
        ),
        NavigationNode::leaf("Discharge"),
    ])
    .expect("demo navigation tree is valid")
}

pub fn patient_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("id", "MRN"),
        FieldDescriptor::new("name", "Patient"),
        FieldDescriptor::new("age", "Age").searchable(false),
        FieldDescriptor::new("sex", "Sex").searchable(false),
        FieldDescriptor::new("ward", "Ward"),
        FieldDescriptor::new("bed", "Bed").sortable(false),
        FieldDescriptor::new("admitted", "Admitted"),
        FieldDescriptor::new("attending", "Attending"),
    ]
}

pub fn order_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("id", "Order #"),
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("order", "Order"),
        FieldDescriptor::new("priority", "Priority"),
        FieldDescriptor::new("status", "Status"),
        FieldDescriptor::new("ordered_at", "Ordered"),
        FieldDescriptor::new("ordered_by", "By"),
    ]
}

pub fn lab_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("test", "Test"),
        FieldDescriptor::new("value", "Result").searchable(false),
        FieldDescriptor::new("unit", "Unit").sortable(false).searchable(false),
        FieldDescriptor::new("flag", "Flag"),
        FieldDescriptor::new("collected", "Collected"),
    ]
}

pub fn radiology_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("study", "Study"),
        FieldDescriptor::new("modality", "Mod"),
        FieldDescriptor::new("status", "Status"),
        FieldDescriptor::new("impression", "Impression").sortable(false),
    ]
}

pub fn vital_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("taken_at", "Taken"),
        FieldDescriptor::new("temp_c", "Temp C").searchable(false),
        FieldDescriptor::new("heart_rate", "HR").searchable(false),
        FieldDescriptor::new("bp", "BP").searchable(false),
        FieldDescriptor::new("spo2", "SpO2").searchable(false),
    ]
}

pub fn intake_output_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("shift_start", "Shift"),
        FieldDescriptor::new("source", "Source"),
        FieldDescriptor::new("intake_ml", "In mL").searchable(false),
        FieldDescriptor::new("output_ml", "Out mL").searchable(false),
    ]
}

pub fn nursing_note_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("written_at", "Written"),
        FieldDescriptor::new("kind", "Type"),
        FieldDescriptor::new("note", "Note").sortable(false),
    ]
}

pub fn assessment_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("tool", "Tool"),
        FieldDescriptor::new("score", "Score").searchable(false),
        FieldDescriptor::new("assessed_at", "Assessed"),
        FieldDescriptor::new("reassess", "Reassess").searchable(false),
    ]
}

pub fn discharge_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("patient", "Patient"),
        FieldDescriptor::new("discharged", "Discharged"),
        FieldDescriptor::new("length_of_stay", "LOS").searchable(false),
        FieldDescriptor::new("disposition", "Disposition"),
        FieldDescriptor::new("summary", "Summary").sortable(false),
    ]
}

#[derive(Debug, Clone)]
pub struct DemoWorkspace {
    pub tree: NavigationTree,
    pub sections: Vec<(SectionPath, Collection)>,
}

impl DemoWorkspace {
    pub fn section(&self, path: &[&str]) -> Option<&Collection> {
        self.sections
            .iter()
            .find(|(candidate, _)| candidate.iter().map(String::as_str).eq(path.iter().copied()))
            .map(|(_, collection)| collection)
    }

    pub fn into_workspace(self, options: WorkspaceOptions) -> Result<Workspace> {
        let mut workspace = Workspace::new(self.tree, options);
        for (path, collection) in self.sections {
            let label = path.join(" / ");
            workspace
                .insert_collection(path, collection)
                .with_context(|| format!("register demo section {label}"))?;
        }
        Ok(workspace)
    }
}

pub const DEMO_PATIENTS: usize = 12;

/// The full demo page set. Nursing notes are registered at `["Nursing"]` so
/// the Notes sub-tab exercises prefix lookup.
pub fn demo_workspace(seed: u64) -> Result<DemoWorkspace> {
    let mut faker = ClinicalFaker::new(seed);
    let patients = faker.patients(DEMO_PATIENTS);

    let mut active = Vec::new();
    let mut completed = Vec::new();
    let mut labs = Vec::new();
    let mut radiology = Vec::new();
    let mut vitals = Vec::new();
    let mut intake_output = Vec::new();
    let mut notes = Vec::new();
    let mut assessments = Vec::new();
    let mut discharges = Vec::new();

    for (index, patient) in patients.iter().enumerate() {
        for slot in 0..3 {
            let id = index * 3 + slot;
            active.push(faker.order(id, patient, "Active"));
            completed.push(faker.order(id + 1_000, patient, "Completed"));
            labs.push(faker.lab_result(id, patient));
            vitals.push(faker.vital_signs(id, patient));
            intake_output.push(faker.intake_output(id, patient));
            notes.push(faker.nursing_note(id, patient));
            assessments.push(faker.assessment(id, patient));
        }
        radiology.push(faker.radiology_study(index, patient));
        if index % 3 == 0 {
            discharges.push(faker.discharge_summary(index, patient));
        }
    }

    let patient_records = patients
        .iter()
        .map(|patient| {
            Record::new()
                .with("id", patient.mrn.clone())
                .with("name", patient.name.clone())
                .with("age", patient.age)
                .with("sex", patient.sex)
                .with("ward", patient.ward)
                .with("bed", patient.bed.clone())
                .with("admitted", patient.admitted.to_string())
                .with("attending", patient.attending)
        })
        .collect();

    let sections = vec![
        (path(&["Patients"]), Collection::new(patient_fields(), patient_records)),
        (path(&["Orders", "Active"]), Collection::new(order_fields(), active)),
        (path(&["Orders", "Completed"]), Collection::new(order_fields(), completed)),
        (path(&["Labs"]), Collection::new(lab_fields(), labs)),
        (path(&["Radiology"]), Collection::new(radiology_fields(), radiology)),
        (path(&["Vitals", "Flowsheet"]), Collection::new(vital_fields(), vitals)),
        (
            path(&["Vitals", "Intake/Output"]),
            Collection::new(intake_output_fields(), intake_output),
        ),
        (path(&["Nursing"]), Collection::new(nursing_note_fields(), notes)),
        (
            path(&["Nursing", "Assessments"]),
            Collection::new(assessment_fields(), assessments),
        ),
        (path(&["Discharge"]), Collection::new(discharge_fields(), discharges)),
    ];

    let sections = sections
        .into_iter()
        .map(|(path, collection)| {
            let collection =
                collection.with_context(|| format!("define demo section {}", path.join("/")))?;
            Ok((path, collection))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DemoWorkspace {
        tree: demo_navigation_tree(),
        sections,
    })
}

/// `[{id, name}]` with ids starting at 1.
pub fn named_collection(names: &[&str]) -> Result<Collection> {
    let records = names
        .iter()
        .enumerate()
        .map(|(index, name)| Record::new().with("id", index as i64 + 1).with("name", *name))
        .collect();
    Collection::new(
        vec![
            FieldDescriptor::new("id", "ID").searchable(false),
            FieldDescriptor::new("name", "Name"),
        ],
        records,
    )
    .context("define named collection")
}

pub fn path(parts: &[&str]) -> SectionPath {
    parts.iter().map(|part| (*part).to_owned()).collect()
}

#[derive(Debug, Serialize)]
struct WorkspaceFileFixture<'a> {
    navigation: &'a [NavigationNode],
    sections: Vec<SectionFixture<'a>>,
}

#[derive(Debug, Serialize)]
struct SectionFixture<'a> {
    path: &'a [String],
    id_field: &'a str,
    fields: &'a [FieldDescriptor],
    records: &'a [Record],
}

/// The demo data in the JSON workspace file layout the CLI reads.
pub fn demo_workspace_json(seed: u64) -> Result<String> {
    let demo = demo_workspace(seed)?;
    let fixture = WorkspaceFileFixture {
        navigation: demo.tree.roots(),
        sections: demo
            .sections
            .iter()
            .map(|(path, collection)| SectionFixture {
                path,
                id_field: collection.id_field(),
                fields: collection.fields(),
                records: collection.records(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&fixture).context("serialize demo workspace")
}

pub fn temp_workspace_file(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("workspace.json");
    std::fs::write(&path, contents)
        .with_context(|| format!("write workspace fixture {}", path.display()))?;
    Ok((dir, path))
}
