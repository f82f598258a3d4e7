//! # VASP 后端
//!
//! 每个帧来源是一个 VASP 计算目录，包含 `POSCAR`（结构）与 `EIGENVAL`（本征值）。
//! 构造时一次性读取全部 POSCAR；EIGENVAL 按需读取。目前只支持静态计算（SCF / NSCF），
//! 不提供块矩阵。
//!
//! ## 依赖关系
//! - 被 `parsers/registry.rs` 注册
//! - 子模块: poscar, eigenval

pub mod eigenval;
pub mod poscar;

use super::{atoms_to_structure, BlockRequest, BlockSet, Parser, Sources};
use crate::data::Record;
use crate::error::{DftioError, Result};
use crate::models::Atoms;

use rayon::prelude::*;
use std::slice;

/// VASP 后端
#[derive(Debug)]
pub struct VaspParser {
    sources: Sources,
    structures: Vec<Atoms>,
}

impl VaspParser {
    pub const NAME: &'static str = "vasp";

    pub fn new(sources: Sources) -> Result<Self> {
        let structures = sources
            .iter()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|dir| poscar::read_poscar(&dir.join("POSCAR")))
            .collect::<Result<Vec<_>>>()?;

        log::warn!(
            "VASP parser only supports static (SCF or NSCF) calculations; MD and relaxation runs are not supported yet"
        );

        Ok(VaspParser {
            sources,
            structures,
        })
    }

    /// 注册表使用的构造函数
    pub fn build(sources: Sources) -> Result<Box<dyn Parser>> {
        Ok(Box::new(Self::new(sources)?))
    }

    fn atoms(&self, idx: usize) -> Result<&Atoms> {
        self.structures
            .get(idx)
            .ok_or_else(|| DftioError::IndexOutOfRange {
                field: "sources".to_string(),
                index: idx as i64,
                bound: self.structures.len(),
            })
    }
}

impl Parser for VaspParser {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn sources(&self) -> &Sources {
        &self.sources
    }

    fn get_structure(&self, idx: usize) -> Result<Record> {
        atoms_to_structure(slice::from_ref(self.atoms(idx)?))
    }

    fn get_eigenvalue(&self, idx: usize, band_index_min: usize) -> Result<Record> {
        let path = self.source(idx)?.join("EIGENVAL");
        eigenval::read_eigenval(&path)?.to_record(band_index_min)
    }

    fn get_blocks(&self, _idx: usize, _request: BlockRequest) -> Result<BlockSet> {
        Err(DftioError::NotImplemented(
            "VASP does not support block parsing yet.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::keys::*;
    use crate::parsers::Root;
    use std::fs;

    const POSCAR: &str = "Si2
1.0
0.0 2.715 2.715
2.715 0.0 2.715
2.715 2.715 0.0
Si
2
Direct
0.00 0.00 0.00
0.25 0.25 0.25
";

    #[test]
    fn test_vasp_structure() {
        let dir = tempfile::tempdir().unwrap();
        let run = dir.path().join("scf_0");
        fs::create_dir(&run).unwrap();
        fs::write(run.join("POSCAR"), POSCAR).unwrap();

        let sources = Sources::discover(Root::from(dir.path()), "scf").unwrap();
        let parser = VaspParser::new(sources).unwrap();
        assert_eq!(parser.len(), 1);
        assert_eq!(parser.formula(0).unwrap(), "Si2");

        let structure = parser.get_structure(0).unwrap();
        assert_eq!(structure[POSITIONS_KEY].shape(), &[1, 2, 3]);
        let pos = structure[POSITIONS_KEY].as_f32().unwrap();
        assert!((pos[[0, 1, 0]] - 1.3575).abs() < 1e-5);

        assert!(matches!(
            parser.get_eigenvalue(0, 0),
            Err(DftioError::FileNotFound { .. })
        ));
        assert!(matches!(
            parser.get_blocks(0, BlockRequest::default()),
            Err(DftioError::NotImplemented(_))
        ));
        assert!(parser.get_structure(1).is_err());
    }

    #[test]
    fn test_vasp_missing_poscar() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("scf_0")).unwrap();

        let sources = Sources::discover(Root::from(dir.path()), "scf").unwrap();
        assert!(matches!(
            VaspParser::new(sources),
            Err(DftioError::FileNotFound { .. })
        ));
    }
}
