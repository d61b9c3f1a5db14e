//! Embedded reference tables
//!
//! A curated subset of ATT&CK enterprise, CAPEC and the NIST SP 800-53 / CIS
//! v8 control mappings. Operators replace it with [`ReferenceData::load`].
//!
//! [`ReferenceData::load`]: crate::ReferenceData::load

use crate::protocol::ProtocolProfile;
use crate::store::{ControlEntry, ReferenceDocument};
use crate::vocab::{CapecEntry, StrideCategory, Tactic, Technique, TechniqueBinding, TechniqueScope};
use std::collections::BTreeMap;

use StrideCategory::{
    DenialOfService, ElevationOfPrivilege, InformationDisclosure, Repudiation, Spoofing, Tampering,
};
use Tactic::{
    Collection, CredentialAccess, DefenseEvasion, Discovery, Execution, Exfiltration, Impact,
    InitialAccess, LateralMovement, Persistence, PrivilegeEscalation,
};

/// Version tag of the embedded tables
pub const BUILTIN_VERSION: &str = "builtin-2025.1";

fn base_scores() -> BTreeMap<StrideCategory, f64> {
    BTreeMap::from([
        (Spoofing, 6.0),
        (Tampering, 6.5),
        (Repudiation, 4.0),
        (InformationDisclosure, 6.0),
        (DenialOfService, 5.0),
        (ElevationOfPrivilege, 8.0),
    ])
}

fn techniques() -> Vec<Technique> {
    vec![
        Technique::new("T1005", "Data from Local System", &[Collection]),
        Technique::new("T1021", "Remote Services", &[LateralMovement]),
        Technique::new("T1036", "Masquerading", &[DefenseEvasion]),
        Technique::new("T1040", "Network Sniffing", &[CredentialAccess, Discovery]),
        Technique::new("T1041", "Exfiltration Over C2 Channel", &[Exfiltration]),
        Technique::new("T1059", "Command and Scripting Interpreter", &[Execution]),
        Technique::new("T1068", "Exploitation for Privilege Escalation", &[PrivilegeEscalation]),
        Technique::new("T1070", "Indicator Removal", &[DefenseEvasion]),
        Technique::new(
            "T1078",
            "Valid Accounts",
            &[InitialAccess, Persistence, PrivilegeEscalation, DefenseEvasion],
        ),
        Technique::new("T1083", "File and Directory Discovery", &[Discovery]),
        Technique::new("T1110", "Brute Force", &[CredentialAccess]),
        Technique::new(
            "T1134",
            "Access Token Manipulation",
            &[DefenseEvasion, PrivilegeEscalation],
        ),
        Technique::new("T1190", "Exploit Public-Facing Application", &[InitialAccess]),
        Technique::new("T1213", "Data from Information Repositories", &[Collection]),
        Technique::new("T1498", "Network Denial of Service", &[Impact]),
        Technique::new("T1499", "Endpoint Denial of Service", &[Impact]),
        Technique::new(
            "T1548",
            "Abuse Elevation Control Mechanism",
            &[PrivilegeEscalation, DefenseEvasion],
        ),
        Technique::new("T1552", "Unsecured Credentials", &[CredentialAccess]),
        Technique::new("T1557", "Adversary-in-the-Middle", &[CredentialAccess, Collection]),
        Technique::new("T1562", "Impair Defenses", &[DefenseEvasion]),
        Technique::new("T1565", "Data Manipulation", &[Impact]),
        Technique::new("T1565.001", "Stored Data Manipulation", &[Impact]),
        Technique::new("T1565.002", "Transmitted Data Manipulation", &[Impact]),
    ]
}

fn stride_techniques() -> BTreeMap<StrideCategory, Vec<TechniqueBinding>> {
    use TechniqueScope::{Dataflow, Element};
    let bind = TechniqueBinding::scoped;
    BTreeMap::from([
        (
            Spoofing,
            vec![
                bind("T1078", Element),
                bind("T1036", Element),
                bind("T1557", Dataflow),
                TechniqueBinding::any("T1110"),
            ],
        ),
        (
            Tampering,
            vec![
                bind("T1059", Element),
                bind("T1565.001", Element),
                bind("T1557", Dataflow),
                bind("T1565.002", Dataflow),
            ],
        ),
        (
            Repudiation,
            vec![TechniqueBinding::any("T1070"), TechniqueBinding::any("T1562")],
        ),
        (
            InformationDisclosure,
            vec![
                bind("T1005", Element),
                bind("T1083", Element),
                bind("T1213", Element),
                bind("T1040", Dataflow),
                bind("T1041", Dataflow),
            ],
        ),
        (
            DenialOfService,
            vec![bind("T1499", Element), bind("T1498", Dataflow)],
        ),
        (
            ElevationOfPrivilege,
            vec![
                bind("T1068", Element),
                bind("T1548", Element),
                bind("T1134", Element),
                bind("T1021", Dataflow),
            ],
        ),
    ])
}

fn capec(id: &str, name: &str, category: StrideCategory, techniques: &[&str]) -> CapecEntry {
    CapecEntry {
        id: id.to_string(),
        name: name.to_string(),
        category,
        techniques: techniques.iter().map(ToString::to_string).collect(),
    }
}

fn capec_catalog() -> Vec<CapecEntry> {
    vec![
        capec("CAPEC-7", "Blind SQL Injection", InformationDisclosure, &["T1190"]),
        capec("CAPEC-66", "SQL Injection", Tampering, &["T1190"]),
        capec("CAPEC-94", "Adversary in the Middle", Tampering, &["T1557"]),
        capec("CAPEC-125", "Flooding", DenialOfService, &["T1498", "T1499"]),
        capec("CAPEC-126", "Path Traversal", InformationDisclosure, &["T1083"]),
        capec("CAPEC-151", "Identity Spoofing", Spoofing, &["T1036", "T1078"]),
        capec("CAPEC-153", "Input Data Manipulation", Tampering, &["T1565"]),
        capec("CAPEC-157", "Sniffing Attacks", InformationDisclosure, &["T1040"]),
        capec("CAPEC-233", "Privilege Escalation", ElevationOfPrivilege, &["T1068", "T1548"]),
        capec("CAPEC-242", "Code Injection", ElevationOfPrivilege, &["T1059"]),
        capec("CAPEC-268", "Audit Log Manipulation", Repudiation, &["T1070"]),
        capec("CAPEC-560", "Use of Known Domain Credentials", Spoofing, &["T1078"]),
    ]
}

fn control(id: &str, name: &str) -> ControlEntry {
    ControlEntry {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn nist_controls() -> BTreeMap<String, Vec<ControlEntry>> {
    let nist = control;
    let integrity = || nist("SI-7", "Software, Firmware, and Information Integrity");
    let transport = || nist("SC-8", "Transmission Confidentiality and Integrity");
    let dos = || nist("SC-5", "Denial-of-Service Protection");
    BTreeMap::from([
        ("T1040".into(), vec![transport()]),
        ("T1059".into(), vec![nist("CM-7", "Least Functionality")]),
        ("T1068".into(), vec![nist("SI-2", "Flaw Remediation")]),
        ("T1070".into(), vec![nist("AU-9", "Protection of Audit Information")]),
        (
            "T1078".into(),
            vec![
                nist("AC-2", "Account Management"),
                nist("IA-2", "Identification and Authentication (Organizational Users)"),
            ],
        ),
        ("T1110".into(), vec![nist("AC-7", "Unsuccessful Logon Attempts")]),
        ("T1190".into(), vec![nist("SI-10", "Information Input Validation")]),
        ("T1498".into(), vec![dos()]),
        ("T1499".into(), vec![dos()]),
        ("T1548".into(), vec![nist("AC-6", "Least Privilege")]),
        ("T1557".into(), vec![transport()]),
        ("T1562".into(), vec![nist("SI-4", "System Monitoring")]),
        ("T1565".into(), vec![integrity()]),
        ("T1565.001".into(), vec![integrity()]),
        ("T1565.002".into(), vec![integrity(), transport()]),
    ])
}

fn cis_controls() -> BTreeMap<String, Vec<ControlEntry>> {
    let cis = control;
    let encrypt = || cis("3.10", "Encrypt Sensitive Data in Transit");
    BTreeMap::from([
        ("T1040".into(), vec![encrypt()]),
        ("T1059".into(), vec![cis("2.7", "Allowlist Authorized Scripts")]),
        (
            "T1068".into(),
            vec![cis("7.3", "Perform Automated Operating System Patch Management")],
        ),
        ("T1070".into(), vec![cis("8.9", "Centralize Audit Logs")]),
        (
            "T1078".into(),
            vec![
                cis("5.3", "Disable Dormant Accounts"),
                cis("6.5", "Require MFA for Administrative Access"),
            ],
        ),
        (
            "T1110".into(),
            vec![cis("6.3", "Require MFA for Externally-Exposed Applications")],
        ),
        (
            "T1190".into(),
            vec![cis(
                "16.1",
                "Establish and Maintain a Secure Application Development Process",
            )],
        ),
        (
            "T1548".into(),
            vec![cis(
                "5.4",
                "Restrict Administrator Privileges to Dedicated Administrator Accounts",
            )],
        ),
        ("T1557".into(), vec![encrypt()]),
        ("T1562".into(), vec![cis("8.2", "Collect Audit Logs")]),
        ("T1565.002".into(), vec![encrypt()]),
    ])
}

fn protocols() -> BTreeMap<String, ProtocolProfile> {
    let neutral = ProtocolProfile::neutral;
    BTreeMap::from([
        ("http".into(), neutral().with_factor(1.2)),
        ("https".into(), neutral().with_factor(0.9).integrity_protected()),
        (
            "ssh".into(),
            neutral().with_factor(0.8).authenticated().integrity_protected(),
        ),
        ("telnet".into(), neutral().with_factor(1.3).adding(InformationDisclosure)),
        ("ftp".into(), neutral().with_factor(1.2).adding(InformationDisclosure)),
        (
            "dns".into(),
            neutral().adding(Spoofing).adding(DenialOfService),
        ),
        ("mqtt".into(), neutral().adding(DenialOfService)),
        ("mtls".into(), neutral().with_factor(0.8).authenticated().integrity_protected()),
        ("kerberos".into(), neutral().authenticated()),
        ("ldap".into(), neutral().with_factor(1.1)),
        ("sql".into(), neutral().with_factor(1.1)),
        ("jdbc".into(), neutral().with_factor(1.1)),
        ("grpc".into(), neutral()),
    ])
}

/// Embedded tables as a document
pub(crate) fn document() -> ReferenceDocument {
    ReferenceDocument {
        version: BUILTIN_VERSION.to_string(),
        base_scores: Some(base_scores()),
        stride_techniques: Some(stride_techniques()),
        techniques: Some(techniques()),
        capec: Some(capec_catalog()),
        nist_controls: Some(nist_controls()),
        cis_controls: Some(cis_controls()),
        protocols: Some(protocols()),
    }
}
