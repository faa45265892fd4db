//! # 模型相似性比较
//!
//! 判断两个精修后的模型能否作为同一参考来计算差值图。
//!
//! ## 比较顺序
//! 1. 晶体对称性（硬性）
//! 2. 原子数一致（硬性，逐原子比较的前提）
//! 3. 原子名序列（仅警告，独立精修的模型命名可能不同）
//! 4. 同序号原子间距离（硬性）
//!
//! ## 依赖关系
//! - 被 `diffmap/mod.rs` 使用
//! - 使用 `parsers/pdb.rs`, `models/structure.rs`

use crate::error::Result;
use crate::models::{AtomicModel, SymmetryTolerance};
use crate::parsers::pdb;
use crate::utils::RunLog;

use std::path::Path;

/// 读取两个 PDB 文件并比较
pub fn are_pdbs_similar(
    first: &Path,
    second: &Path,
    tolerance: &SymmetryTolerance,
    log: &RunLog,
) -> Result<bool> {
    let model_1 = pdb::read_pdb_file(first)?;
    let model_2 = pdb::read_pdb_file(second)?;
    Ok(are_models_similar(&model_1, &model_2, tolerance, log))
}

/// 比较两个已读入的模型
pub fn are_models_similar(
    model_1: &AtomicModel,
    model_2: &AtomicModel,
    tolerance: &SymmetryTolerance,
    log: &RunLog,
) -> bool {
    let (sym_1, sym_2) = match (&model_1.symmetry, &model_2.symmetry) {
        (Some(s1), Some(s2)) => (s1, s2),
        _ => {
            log.error("PDB file has no crystal symmetry (CRYST1) record");
            return false;
        }
    };

    if !sym_1.is_similar(sym_2, tolerance) {
        log.error(&format!(
            "PDB file symmetries are too different ({} vs {}; relative length tolerance {}, angle tolerance {}°)",
            sym_1.space_group,
            sym_2.space_group,
            tolerance.rel_cell_length,
            tolerance.abs_cell_angle
        ));
        return false;
    }

    if model_1.atoms.len() != model_2.atoms.len() {
        log.error(&format!(
            "Different number of atoms in pdb files ({} vs {}), cannot compare coordinates",
            model_1.atoms.len(),
            model_2.atoms.len()
        ));
        return false;
    }

    if model_1.atom_names() != model_2.atom_names() {
        log.warn("Different type or order of atoms in pdb files");
    }

    // 假定两个模型原子顺序一致
    for (atom_1, atom_2) in model_1.atoms.iter().zip(model_2.atoms.iter()) {
        let diff = atom_1.distance_to(atom_2);
        if diff > tolerance.abs_coord_diff {
            log.error(&format!(
                "PDB atom coordinates have difference > tolerance ({} Å): atom {} moved {:.2} Å",
                tolerance.abs_coord_diff, atom_1.name, diff
            ));
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrystalSymmetry, ModelAtom, UnitCell};
    use crate::parsers::pdb::tests::pdb_text;
    use crate::utils::log::Level;

    fn model(cell: [f64; 6], sg: &str, atoms: &[(&str, [f64; 3])]) -> AtomicModel {
        let symmetry = CrystalSymmetry::new(
            UnitCell::new(cell[0], cell[1], cell[2], cell[3], cell[4], cell[5]),
            sg,
        );
        let atoms = atoms
            .iter()
            .map(|(name, xyz)| ModelAtom::new(*name, *xyz))
            .collect();
        AtomicModel::new("model", Some(symmetry), atoms)
    }

    const CELL: [f64; 6] = [78.1, 78.1, 37.2, 90.0, 90.0, 90.0];

    #[test]
    fn test_identical_models_similar() {
        let m = model(CELL, "P 43 21 2", &[("N", [1.0, 2.0, 3.0]), ("CA", [2.0, 2.0, 3.0])]);
        let log = RunLog::silent();
        assert!(are_models_similar(&m, &m.clone(), &SymmetryTolerance::default(), &log));
        assert!(log.messages(Level::Error).is_empty());
    }

    #[test]
    fn test_symmetry_gate_is_symmetric() {
        let tol = SymmetryTolerance::default();
        let log = RunLog::silent();
        let atoms = [("CA", [0.0, 0.0, 0.0])];
        let cases = [
            (CELL, [78.5, 78.1, 37.2, 90.0, 90.0, 90.0]),
            (CELL, [79.1, 78.1, 37.2, 90.0, 90.0, 90.0]),
            (CELL, [78.1, 78.1, 37.2, 90.0, 91.2, 90.0]),
        ];
        for (c1, c2) in cases {
            let a = model(c1, "P 43 21 2", &atoms);
            let b = model(c2, "P 43 21 2", &atoms);
            assert_eq!(
                are_models_similar(&a, &b, &tol, &log),
                are_models_similar(&b, &a, &tol, &log)
            );
        }
    }

    #[test]
    fn test_different_space_group_fails() {
        let atoms = [("CA", [0.0, 0.0, 0.0])];
        let a = model(CELL, "P 43 21 2", &atoms);
        let b = model(CELL, "P 41 21 2", &atoms);
        let log = RunLog::silent();
        assert!(!are_models_similar(&a, &b, &SymmetryTolerance::default(), &log));
        assert!(log.messages(Level::Error)[0].contains("symmetries"));
    }

    #[test]
    fn test_atom_names_mismatch_is_soft() {
        let a = model(CELL, "P 43 21 2", &[("CA", [0.0, 0.0, 0.0])]);
        let b = model(CELL, "P 43 21 2", &[("CB", [0.5, 0.0, 0.0])]);
        let log = RunLog::silent();
        assert!(are_models_similar(&a, &b, &SymmetryTolerance::default(), &log));
        assert_eq!(log.messages(Level::Warn).len(), 1);
    }

    #[test]
    fn test_atom_count_mismatch_fails() {
        let a = model(CELL, "P 43 21 2", &[("CA", [0.0, 0.0, 0.0])]);
        let b = model(CELL, "P 43 21 2", &[("CA", [0.0, 0.0, 0.0]), ("CB", [1.0, 0.0, 0.0])]);
        let log = RunLog::silent();
        assert!(!are_models_similar(&a, &b, &SymmetryTolerance::default(), &log));
    }

    #[test]
    fn test_coordinate_tolerance() {
        let a = model(CELL, "P 43 21 2", &[("CA", [0.0, 0.0, 0.0]), ("CB", [1.0, 1.0, 1.0])]);
        let near = model(CELL, "P 43 21 2", &[("CA", [3.0, 4.0, 0.0]), ("CB", [1.0, 1.0, 1.0])]);
        let far = model(CELL, "P 43 21 2", &[("CA", [0.0, 0.0, 0.0]), ("CB", [1.0, 1.0, 6.5])]);
        let tol = SymmetryTolerance::default();
        let log = RunLog::silent();

        assert!(are_models_similar(&a, &near, &tol, &log));
        assert!(!are_models_similar(&a, &far, &tol, &log));
        assert!(log.messages(Level::Error)[0].contains("5 Å"));
    }

    #[test]
    fn test_missing_cryst1_fails() {
        let a = model(CELL, "P 43 21 2", &[("CA", [0.0, 0.0, 0.0])]);
        let mut b = a.clone();
        b.symmetry = None;
        let log = RunLog::silent();
        assert!(!are_models_similar(&a, &b, &SymmetryTolerance::default(), &log));
    }

    #[test]
    fn test_are_pdbs_similar_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = dir.path().join("above.pdb");
        let p2 = dir.path().join("below.pdb");
        std::fs::write(&p1, pdb_text(CELL, "P 43 21 2", &[(" CA", [1.0, 2.0, 3.0])])).unwrap();
        std::fs::write(&p2, pdb_text(CELL, "P 43 21 2", &[(" CA", [1.2, 2.0, 3.0])])).unwrap();

        let log = RunLog::silent();
        assert!(are_pdbs_similar(&p1, &p2, &SymmetryTolerance::default(), &log).unwrap());
    }
}
