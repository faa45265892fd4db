//! # 原子模型数据模型
//!
//! 定义晶体对称性（晶胞参数 + 空间群）和有序原子列表，
//! 以及比较两个模型时使用的容差。
//!
//! ## 依赖关系
//! - 被 `parsers/pdb.rs` 和 `analysis/similarity.rs` 使用
//! - 无外部模块依赖

/// 晶胞参数 (a, b, c, alpha, beta, gamma)
/// 长度单位 Å，角度单位：度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        UnitCell {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn lengths(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn angles(&self) -> [f64; 3] {
        [self.alpha, self.beta, self.gamma]
    }

    /// 在容差内比较晶胞参数
    ///
    /// 边长比较 `|min/max - 1|`，与参数顺序无关。
    pub fn is_similar_to(&self, other: &UnitCell, rel_length_tol: f64, abs_angle_tol: f64) -> bool {
        let lengths_ok = self
            .lengths()
            .iter()
            .zip(other.lengths().iter())
            .all(|(&l1, &l2)| {
                let (lo, hi) = if l1 <= l2 { (l1, l2) } else { (l2, l1) };
                hi > 0.0 && (lo / hi - 1.0).abs() <= rel_length_tol
            });

        let angles_ok = self
            .angles()
            .iter()
            .zip(other.angles().iter())
            .all(|(a1, a2)| (a1 - a2).abs() <= abs_angle_tol);

        lengths_ok && angles_ok
    }
}

/// 晶体对称性
#[derive(Debug, Clone, PartialEq)]
pub struct CrystalSymmetry {
    pub cell: UnitCell,

    /// 空间群符号（如 "P 21 21 21"）
    pub space_group: String,
}

impl CrystalSymmetry {
    pub fn new(cell: UnitCell, space_group: impl Into<String>) -> Self {
        CrystalSymmetry {
            cell,
            space_group: space_group.into(),
        }
    }

    /// 去掉空白并转为大写，"P 21 21 21" 与 "p212121" 视为相同
    pub fn normalized_space_group(&self) -> String {
        self.space_group
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase()
    }

    /// 空间群相同且晶胞在容差内
    pub fn is_similar(&self, other: &CrystalSymmetry, tolerance: &SymmetryTolerance) -> bool {
        self.normalized_space_group() == other.normalized_space_group()
            && self.cell.is_similar_to(
                &other.cell,
                tolerance.rel_cell_length,
                tolerance.abs_cell_angle,
            )
    }
}

/// 模型比较容差，整个运行期间不变
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryTolerance {
    /// 晶胞边长相对容差
    pub rel_cell_length: f64,
    /// 晶胞角度绝对容差（度）
    pub abs_cell_angle: f64,
    /// 原子坐标绝对容差（Å）
    pub abs_coord_diff: f64,
}

impl Default for SymmetryTolerance {
    fn default() -> Self {
        SymmetryTolerance {
            rel_cell_length: 0.01,
            abs_cell_angle: 1.0,
            abs_coord_diff: 5.0,
        }
    }
}

/// 模型中的原子
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAtom {
    /// 原子名（PDB 第 13-16 列，已去空白）
    pub name: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub xyz: [f64; 3],
}

impl ModelAtom {
    pub fn new(name: impl Into<String>, xyz: [f64; 3]) -> Self {
        ModelAtom {
            name: name.into(),
            xyz,
        }
    }

    /// 与另一原子的欧氏距离
    pub fn distance_to(&self, other: &ModelAtom) -> f64 {
        self.xyz
            .iter()
            .zip(other.xyz.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// 原子模型，读入后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicModel {
    /// 模型名称（通常为文件名）
    pub name: String,

    /// 晶体对称性（缺少 CRYST1 记录时为 None）
    pub symmetry: Option<CrystalSymmetry>,

    /// 原子列表，保持文件顺序
    pub atoms: Vec<ModelAtom>,
}

impl AtomicModel {
    pub fn new(
        name: impl Into<String>,
        symmetry: Option<CrystalSymmetry>,
        atoms: Vec<ModelAtom>,
    ) -> Self {
        AtomicModel {
            name: name.into(),
            symmetry,
            atoms,
        }
    }

    /// 有序原子名序列
    pub fn atom_names(&self) -> Vec<&str> {
        self.atoms.iter().map(|a| a.name.as_str()).collect()
    }
}
