//! 集成测试共用的内存后端

#![allow(dead_code)]

use dftio::data::keys::*;
use dftio::data::{BlockFrame, Field, Record};
use dftio::{BlockRequest, BlockSet, DftioError, Parser, Result, Root, Sources};
use ndarray::{arr1, Array2, Array3};
use num_complex::Complex32;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const A: f32 = 2.715;

/// 每个下标是一个 Si2 结构，帧数可配
pub struct MockParser {
    sources: Sources,
    n_frame: usize,
    /// 该下标返回二维坐标
    pub broken: Option<usize>,
    pub complex_hamiltonian: bool,
    pub with_basis: bool,
}

impl MockParser {
    pub fn new(n_source: usize, n_frame: usize) -> Self {
        let paths: Vec<PathBuf> = (0..n_source)
            .map(|i| PathBuf::from(format!("mock/run{}", i)))
            .collect();
        MockParser {
            sources: Sources::discover(Root::from(paths), "").unwrap(),
            n_frame,
            broken: None,
            complex_hamiltonian: false,
            with_basis: true,
        }
    }

    fn block_frames(&self, value: f32) -> Vec<BlockFrame> {
        (0..self.n_frame)
            .map(|nf| {
                let mut frame = BlockFrame::new();
                let onsite = Array2::<f32>::from_elem((4, 4), value + nf as f32);
                if self.complex_hamiltonian {
                    frame.insert(
                        ONSITE_BLOCK_KEY.to_string(),
                        Field::from(onsite.mapv(|v| Complex32::new(v, 0.5))),
                    );
                } else {
                    frame.insert(ONSITE_BLOCK_KEY.to_string(), Field::from(onsite));
                }
                frame.insert(
                    block_key(0, 1, [0, 0, 1]),
                    Field::from(Array2::<f32>::eye(4)),
                );
                frame
            })
            .collect()
    }
}

impl Parser for MockParser {
    fn name(&self) -> &str {
        "mock"
    }

    fn sources(&self) -> &Sources {
        &self.sources
    }

    fn get_structure(&self, idx: usize) -> Result<Record> {
        self.sources.get(idx)?;
        let mut data = Record::new();
        data.insert(ATOMIC_NUMBERS_KEY.to_string(), Field::from(arr1(&[14i32, 14])));
        data.insert(PBC_KEY.to_string(), Field::from(arr1(&[true, true, true])));

        let mut cell = Array3::<f32>::zeros((self.n_frame, 3, 3));
        let mut pos = Array3::<f32>::zeros((self.n_frame, 2, 3));
        for nf in 0..self.n_frame {
            for (i, row) in [[0.0, A, A], [A, 0.0, A], [A, A, 0.0]].iter().enumerate() {
                for j in 0..3 {
                    cell[[nf, i, j]] = row[j];
                }
            }
            for j in 0..3 {
                pos[[nf, 1, j]] = A / 2.0 + 0.01 * nf as f32;
            }
        }
        data.insert(CELL_KEY.to_string(), Field::from(cell));

        if self.broken == Some(idx) {
            data.insert(
                POSITIONS_KEY.to_string(),
                Field::from(Array2::<f32>::zeros((2, 3))),
            );
        } else {
            data.insert(POSITIONS_KEY.to_string(), Field::from(pos));
        }
        Ok(data)
    }

    fn get_eigenvalue(&self, idx: usize, band_index_min: usize) -> Result<Record> {
        self.sources.get(idx)?;
        let n_band = 6usize
            .checked_sub(band_index_min)
            .ok_or_else(|| DftioError::InvalidArgument("band_index_min too large".to_string()))?;
        let eigs = Array3::<f32>::from_shape_fn((self.n_frame, 2, n_band), |(f, k, b)| {
            -5.0 + (b + band_index_min) as f32 + 0.1 * k as f32 + f as f32
        });
        let kpts = Array2::<f32>::from_shape_fn((2, 3), |(k, j)| if j == 0 { 0.5 * k as f32 } else { 0.0 });

        let mut data = Record::new();
        data.insert(ENERGY_EIGENVALUE_KEY.to_string(), Field::from(eigs));
        data.insert(KPOINT_KEY.to_string(), Field::from(kpts));
        Ok(data)
    }

    fn get_blocks(&self, idx: usize, request: BlockRequest) -> Result<BlockSet> {
        self.sources.get(idx)?;
        Ok(BlockSet {
            hamiltonian: request.hamiltonian.then(|| self.block_frames(1.0)),
            overlap: request.overlap.then(|| self.block_frames(0.0)),
            density_matrix: request.density_matrix.then(|| self.block_frames(2.0)),
        })
    }

    fn get_basis(&self, idx: usize) -> Result<BTreeMap<String, String>> {
        self.sources.get(idx)?;
        if !self.with_basis {
            return Err(DftioError::NotImplemented("mock has no basis".to_string()));
        }
        let mut basis = BTreeMap::new();
        basis.insert("Si".to_string(), "2s2p1d".to_string());
        Ok(basis)
    }
}

/// 目录下的全部条目名（排序）
pub fn entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
